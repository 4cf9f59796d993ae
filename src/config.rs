//! Construction-time configuration (§10.3 of SPEC_FULL).

use serde::{Deserialize, Serialize};

fn default_max_gpu_items_per_frame() -> usize {
    5
}

/// Deserializable knobs for [`crate::loader::Loader::new`]. Mirrors how
/// `material_loader.rs`'s `MaterialParams` is `Serialize + Deserialize` so
/// an embedding application can load this from a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// `0` means auto-detect via [`crate::autoscale::optimal_thread_count`].
    pub thread_count: usize,
    #[serde(default = "default_max_gpu_items_per_frame")]
    pub max_gpu_items_per_frame: usize,
    /// When `true` (the default), `thread_count == 0` triggers auto-sizing.
    /// When `false`, `thread_count == 0` is clamped up to 1 worker instead.
    pub auto_size: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            thread_count: 0,
            max_gpu_items_per_frame: default_max_gpu_items_per_frame(),
            auto_size: true,
        }
    }
}

impl LoaderConfig {
    /// Resolves `thread_count` to a concrete worker count, applying the
    /// §4.7 auto-sizing table when requested.
    pub fn resolved_thread_count(&self) -> usize {
        if self.thread_count > 0 {
            return self.thread_count.clamp(
                crate::autoscale::MIN_THREAD_COUNT,
                crate::autoscale::MAX_THREAD_COUNT,
            );
        }
        if self.auto_size {
            crate::autoscale::optimal_thread_count(Some(crate::autoscale::detect_cores()))
        } else {
            crate::autoscale::MIN_THREAD_COUNT
        }
    }
}
