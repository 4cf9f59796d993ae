//! Crate-wide error taxonomy.
//!
//! Every per-request failure the loader can produce is one of these
//! variants. None of them are fatal to the worker or pump that produced
//! them -- see `spec.md` §7 for the propagation policy. Programmer-error
//! conditions (a poisoned lock, a worker pool that failed to spawn any
//! thread) are not represented here; those panic at the call site instead.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to decode {kind}: {message}")]
    DecodeError { kind: &'static str, message: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dependency missing: {0}")]
    DependencyMissing(String),

    #[error("Device error: {0}")]
    DeviceError(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, LoaderError>;

impl LoaderError {
    /// Renders the message the way `LoadResult::error_message` stores it.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
