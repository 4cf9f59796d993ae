//! Property-based checks for the quantified invariants in `spec.md` §8
//! (1, 2, 3, 5, 6, 9). Invariants 4, 7, 8 and the concrete scenarios live
//! in `tests/scenarios.rs`.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use async_resource_loader::autoscale::optimal_thread_count;
use async_resource_loader::collab::Collaborators;
use async_resource_loader::request::TextureParams;
use async_resource_loader::testing::{
    FakeActivePoolProvider, FakeAudioDecoderFactory, FakeAudioEngine, FakeDevice, FakeFileSystem,
    FakeImageDecoder, FakePool,
};
use async_resource_loader::{Loader, LoaderConfig, Request};

fn collaborators() -> Collaborators {
    let mut fs = FakeFileSystem::new();
    for i in 0..64 {
        fs = fs.with_file(format!("t{i}.png"), vec![1, 2, 3, 4]);
    }
    Collaborators {
        file_system: Arc::new(fs),
        image_decoder: Arc::new(FakeImageDecoder),
        audio_decoder_factory: Arc::new(FakeAudioDecoderFactory),
        device: Arc::new(FakeDevice::new()),
        audio_engine: Arc::new(FakeAudioEngine::new()),
        active_pool: Arc::new(FakeActivePoolProvider::new(Some(Arc::new(FakePool::new(
            "global",
        ))))),
    }
}

fn run_to_completion(loader: &Loader, id: async_resource_loader::TaskId) {
    for _ in 0..500 {
        loader.update();
        if loader.task(id).map(|t| t.is_completed()).unwrap_or(true) {
            return;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!("task never completed");
}

proptest! {
    // Invariants 1 and 2: completed(T) stays within [0, total(T)] and is
    // monotonically non-decreasing at every observation point.
    #[test]
    fn completed_count_bounded_and_monotonic(n in 1usize..20) {
        let mut config = LoaderConfig::default();
        config.max_gpu_items_per_frame = 3;
        let loader = Loader::new(config, collaborators());

        let requests = (0..n)
            .map(|i| {
                Request::texture(
                    format!("t{}", i % 64),
                    TextureParams {
                        path: format!("t{}.png", i % 64),
                        enable_mipmaps: false,
                        width: 0,
                        height: 0,
                    },
                )
            })
            .collect();
        let id = loader.submit(requests, true, None).unwrap();

        let mut last = 0usize;
        for _ in 0..500 {
            loader.update();
            let task = loader.task(id).unwrap();
            let completed = task.completed();
            prop_assert!(completed <= task.total());
            prop_assert!(completed >= last);
            last = completed;
            if task.is_completed() {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        prop_assert_eq!(last, n);
    }

    // Invariant 3: Completed implies every result slot is written.
    #[test]
    fn completed_status_implies_all_results_written(n in 1usize..15) {
        let loader = Loader::new(LoaderConfig::default(), collaborators());
        let requests = (0..n)
            .map(|i| {
                Request::texture(
                    format!("t{}", i % 64),
                    TextureParams {
                        path: format!("t{}.png", i % 64),
                        enable_mipmaps: false,
                        width: 0,
                        height: 0,
                    },
                )
            })
            .collect();
        let id = loader.submit(requests, true, None).unwrap();
        run_to_completion(&loader, id);

        let task = loader.task(id).unwrap();
        prop_assert!(task.is_completed());
        prop_assert_eq!(task.completed(), task.total());
        prop_assert!(task.results().iter().all(|r| r.is_some()));
    }

    // Invariant 5: a single pump pass never finalizes more GPU-bound
    // entries than the configured quota.
    #[test]
    fn single_pump_respects_gpu_quota(n in 1usize..30, quota in 1usize..10) {
        let mut config = LoaderConfig::default();
        config.max_gpu_items_per_frame = quota;
        let loader = Loader::new(config, collaborators());

        let requests = (0..n)
            .map(|i| {
                Request::texture(
                    format!("t{}", i % 64),
                    TextureParams {
                        path: format!("t{}.png", i % 64),
                        enable_mipmaps: false,
                        width: 0,
                        height: 0,
                    },
                )
            })
            .collect();
        let id = loader.submit(requests, true, None).unwrap();

        // Let every request finish decoding before the first pump, so this
        // pass measures the finalize-side quota in isolation.
        std::thread::sleep(Duration::from_millis(80));

        let before = loader.task(id).unwrap().completed();
        loader.update();
        let after = loader.task(id).unwrap().completed();
        prop_assert!(after - before <= quota);
    }

    // Invariant 9: auto-sizing matches the §4.7 table exactly.
    #[test]
    fn auto_sizing_matches_table(cores in 0usize..256) {
        let count = optimal_thread_count(Some(cores));
        let expected = match cores {
            0 => 1,
            1..=2 => 1,
            3..=4 => 2,
            n => (n / 2).min(8),
        };
        prop_assert_eq!(count, expected);
        prop_assert!((1..=16).contains(&count));
    }
}

// Invariant 6 (FIFO across quota stalls) is deterministic given a fixed
// quota and a fixed number of ready entries, so it's expressed as a plain
// test rather than a property: under a quota of 1, finalize order must
// match submission order exactly, one result per pump call.
#[test]
fn fifo_order_preserved_across_quota_stalls() {
    let mut config = LoaderConfig::default();
    config.max_gpu_items_per_frame = 1;
    let loader = Loader::new(config, collaborators());

    let names: Vec<String> = (0..6).map(|i| format!("t{i}")).collect();
    let requests = names
        .iter()
        .map(|name| {
            Request::texture(
                name.clone(),
                TextureParams {
                    path: format!("{name}.png"),
                    enable_mipmaps: false,
                    width: 0,
                    height: 0,
                },
            )
        })
        .collect();
    let id = loader.submit(requests, true, None).unwrap();

    std::thread::sleep(Duration::from_millis(80));

    for expected_name in &names {
        let before = loader.task(id).unwrap().completed();
        loader.update();
        let task = loader.task(id).unwrap();
        assert_eq!(task.completed(), before + 1);
        let results = task.results();
        let just_finalized = results[before].as_ref().expect("slot just finalized");
        assert_eq!(&just_finalized.name, expected_name);
    }
    assert!(loader.task(id).unwrap().is_completed());
}
