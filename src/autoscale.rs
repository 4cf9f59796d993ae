//! Worker-count auto-sizing policy (§4.7), grounded in the original's
//! `GetOptimalThreadCount` and confirmed against `AsyncResourceLoader.cpp`.

use log::warn;

pub const MIN_THREAD_COUNT: usize = 1;
pub const MAX_THREAD_COUNT: usize = 16;

/// Maps detected hardware concurrency to a worker-pool size per the §4.7
/// table. `detected` is injectable so tests can exercise every bucket
/// without depending on the host machine's actual core count.
pub fn optimal_thread_count(detected: Option<usize>) -> usize {
    let cores = match detected {
        Some(c) => c,
        None => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    };

    let count = match cores {
        0 => {
            warn!("detected zero hardware threads; falling back to {MIN_THREAD_COUNT}");
            MIN_THREAD_COUNT
        }
        1..=2 => 1,
        3..=4 => 2,
        n => (n / 2).min(8),
    };

    count.clamp(MIN_THREAD_COUNT, MAX_THREAD_COUNT)
}

/// Production detector backed by `num_cpus`, used when the caller hasn't
/// pinned a thread count in `LoaderConfig`.
pub fn detect_cores() -> usize {
    num_cpus::get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_spec() {
        assert_eq!(optimal_thread_count(Some(0)), 1);
        assert_eq!(optimal_thread_count(Some(1)), 1);
        assert_eq!(optimal_thread_count(Some(2)), 1);
        assert_eq!(optimal_thread_count(Some(3)), 2);
        assert_eq!(optimal_thread_count(Some(4)), 2);
        assert_eq!(optimal_thread_count(Some(5)), 2);
        assert_eq!(optimal_thread_count(Some(16)), 8);
        assert_eq!(optimal_thread_count(Some(64)), 8);
    }
}
