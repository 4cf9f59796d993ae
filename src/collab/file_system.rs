//! The file-system / archive layer collaborator (`spec.md` §1: "exposes
//! `openFile(path) → bytes | not-found`").

/// Reads raw bytes for a path. Workers call this; it must never touch the
/// graphics device or audio engine, and it is expected to be safe to call
/// from any thread.
pub trait FileSystem: Send + Sync {
    /// Returns `None` when the path does not exist, mirroring the
    /// collaborator contract's `bytes | not-found` result.
    fn open_file(&self, path: &str) -> Option<Vec<u8>>;

    fn has_file(&self, path: &str) -> bool {
        self.open_file(path).is_some()
    }
}
