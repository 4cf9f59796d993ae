//! Asynchronous game-resource loader.
//!
//! A two-stage pipeline: a fixed pool of OS worker threads performs the
//! CPU-side decode of a submitted batch of requests, and a frame-budgeted
//! completion pump finalizes decoded results on the caller's thread
//! (typically the render thread, since finalize touches the graphics
//! device and audio engine). See `DESIGN.md` for how each module grounds
//! in this crate's reference implementations.

pub mod autoscale;
pub mod collab;
pub mod config;
pub mod error;
pub mod handle;
pub mod loader;
pub mod pump;
pub mod request;
pub mod result;
pub mod script_api;
pub mod task;
pub mod worker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use collab::Collaborators;
pub use config::LoaderConfig;
pub use error::LoaderError;
pub use loader::Loader;
pub use request::{Request, RequestPayload, ResourceKind};
pub use result::LoadResult;
pub use task::{Task, TaskId, TaskStatus};
