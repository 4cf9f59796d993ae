//! Concrete end-to-end scenarios mirroring `spec.md` §8's S1-S6, plus the
//! cancellation/idempotency invariants (7, 8).

use std::sync::Arc;
use std::time::Duration;

use async_resource_loader::collab::Collaborators;
use async_resource_loader::request::{
    MusicParams, ResourceKind, SoundEffectParams, SpriteParams, SpriteTextureRef, TextureParams,
    TrueTypeFontParams,
};
use async_resource_loader::testing::{
    FakeActivePoolProvider, FakeAudioDecoderFactory, FakeAudioEngine, FakeDevice, FakeFileSystem,
    FakeImageDecoder, FakePool, SlowFakeAudioDecoderFactory,
};
use async_resource_loader::handle::{SpriteBatchHandle, TextureBatchHandle};
use async_resource_loader::{Loader, LoaderConfig, Request};

fn collaborators_with(file_system: FakeFileSystem, pool: Arc<FakePool>) -> Collaborators {
    Collaborators {
        file_system: Arc::new(file_system),
        image_decoder: Arc::new(FakeImageDecoder),
        audio_decoder_factory: Arc::new(FakeAudioDecoderFactory),
        device: Arc::new(FakeDevice::new()),
        audio_engine: Arc::new(FakeAudioEngine::new()),
        active_pool: Arc::new(FakeActivePoolProvider::new(Some(pool))),
    }
}

fn wait_for<F: Fn() -> bool>(loader: &Loader, done: F) {
    for _ in 0..200 {
        loader.update();
        if done() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for task to finish");
}

#[test]
fn s1_single_texture_pool_mode() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new().with_file("a.png", vec![1, 2, 3, 4]);
    let loader = Loader::new(LoaderConfig::default(), collaborators_with(fs, pool.clone()));

    let id = loader
        .submit(
            vec![Request::texture(
                "t1",
                TextureParams {
                    path: "a.png".into(),
                    enable_mipmaps: true,
                    width: 0,
                    height: 0,
                },
            )],
            true,
            None,
        )
        .expect("non-empty batch returns a task");

    wait_for(&loader, || loader.task(id).unwrap().is_completed());

    let task = loader.task(id).unwrap();
    let results = task.results();
    assert_eq!(results.len(), 1);
    let result = results[0].as_ref().unwrap();
    assert!(result.success);
    assert_eq!(result.name, "t1");
    assert_eq!(result.kind, ResourceKind::Texture);
    assert!(pool.contains(ResourceKind::Texture, "t1"));
}

#[test]
fn s2_mixed_success_batch() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new()
        .with_file("ok.png", vec![1, 2, 3, 4])
        .with_file("s.wav", vec![9, 9, 9, 9]);
    let loader = Loader::new(LoaderConfig::default(), collaborators_with(fs, pool));

    let requests = vec![
        Request::texture(
            "ok",
            TextureParams {
                path: "ok.png".into(),
                enable_mipmaps: false,
                width: 0,
                height: 0,
            },
        ),
        Request::texture(
            "bad",
            TextureParams {
                path: "missing.png".into(),
                enable_mipmaps: false,
                width: 0,
                height: 0,
            },
        ),
        Request::sound_effect(
            "s1",
            SoundEffectParams {
                path: "s.wav".into(),
            },
        ),
        Request::true_type_font(
            "f1",
            TrueTypeFontParams {
                path: "f.ttf".into(),
                width: 0.0,
                height: 16.0,
            },
        ),
    ];

    let id = loader.submit(requests, true, None).unwrap();
    wait_for(&loader, || loader.task(id).unwrap().is_completed());

    let task = loader.task(id).unwrap();
    let results = task.results();
    let success: Vec<bool> = results.iter().map(|r| r.as_ref().unwrap().success).collect();
    assert_eq!(success, vec![true, false, true, false]);
    assert!(results[1].as_ref().unwrap().error_message.starts_with("File not found"));
    assert!(results[3]
        .as_ref()
        .unwrap()
        .error_message
        .starts_with("Invalid parameter: Invalid font size"));
    assert_eq!(task.completed(), 4);
}

#[test]
fn s3_gpu_quota_throttling() {
    let pool = Arc::new(FakePool::new("global"));
    let mut fs = FakeFileSystem::new();
    for i in 0..5 {
        fs = fs.with_file(format!("t{i}.png"), vec![1, 2, 3, 4]);
    }
    let mut config = LoaderConfig::default();
    config.max_gpu_items_per_frame = 2;
    let loader = Loader::new(config, collaborators_with(fs, pool));

    let requests = (0..5)
        .map(|i| {
            Request::texture(
                format!("t{i}"),
                TextureParams {
                    path: format!("t{i}.png"),
                    enable_mipmaps: false,
                    width: 0,
                    height: 0,
                },
            )
        })
        .collect();
    let id = loader.submit(requests, true, None).unwrap();

    // Let the worker decode everything before pumping, so each `update()`
    // call below only exercises the finalize-side quota.
    std::thread::sleep(Duration::from_millis(50));

    loader.update();
    let task = loader.task(id).unwrap();
    assert_eq!(task.completed(), 2);
    assert!(!task.is_completed());

    loader.update();
    assert_eq!(task.completed(), 4);
    assert!(!task.is_completed());

    loader.update();
    assert_eq!(task.completed(), 5);
    assert!(task.is_completed());
}

#[test]
fn s5_idempotent_music_insertion() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new().with_file("b.ogg", vec![1, 2, 3, 4]);
    let loader = Loader::new(LoaderConfig::default(), collaborators_with(fs, pool.clone()));

    let make = || {
        Request::music(
            "bgm",
            MusicParams {
                path: "b.ogg".into(),
                loop_start: 0.0,
                loop_end: 0.0,
                stream: false,
            },
        )
    };

    let id = loader.submit(vec![make(), make()], true, None).unwrap();
    wait_for(&loader, || loader.task(id).unwrap().is_completed());

    let task = loader.task(id).unwrap();
    let results = task.results();
    assert!(results[0].as_ref().unwrap().success);
    assert!(results[1].as_ref().unwrap().success);
    assert!(pool.contains(ResourceKind::Music, "bgm"));
}

#[test]
fn cancellation_before_pop_blocks_pool_insertion() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new().with_file("a.png", vec![1, 2, 3, 4]);
    let loader = Loader::new(LoaderConfig::default(), collaborators_with(fs, pool.clone()));

    let id = loader
        .submit(
            vec![Request::texture(
                "t1",
                TextureParams {
                    path: "a.png".into(),
                    enable_mipmaps: false,
                    width: 0,
                    height: 0,
                },
            )],
            true,
            None,
        )
        .unwrap();

    loader.cancel(id);
    wait_for(&loader, || {
        loader
            .task(id)
            .map(|t| t.is_cancelled() && t.completed() >= 1)
            .unwrap_or(true)
    });

    assert!(!pool.contains(ResourceKind::Texture, "t1"));
}

#[test]
fn clear_all_empties_active_and_completion_state() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new().with_file("a.png", vec![1, 2, 3, 4]);
    let loader = Loader::new(LoaderConfig::default(), collaborators_with(fs, pool));

    let id = loader
        .submit(
            vec![Request::texture(
                "t1",
                TextureParams {
                    path: "a.png".into(),
                    enable_mipmaps: false,
                    width: 0,
                    height: 0,
                },
            )],
            true,
            None,
        )
        .unwrap();

    loader.clear_all();
    assert!(loader.task(id).is_none());
}

#[test]
fn sprite_handle_mode_defaults_anchor_to_half_extent() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new();
    let loader = Loader::new(LoaderConfig::default(), collaborators_with(fs, pool));

    let texture_handle = {
        // Build a texture first so the sprite has something to reference
        // in handle mode.
        let id = loader
            .submit(
                vec![Request::texture(
                    "tex",
                    TextureParams {
                        path: String::new(),
                        enable_mipmaps: false,
                        width: 32,
                        height: 32,
                    },
                )],
                false,
                None,
            )
            .unwrap();
        wait_for(&loader, || loader.task(id).unwrap().is_completed());
        loader.task(id).unwrap().results()[0]
            .as_ref()
            .unwrap()
            .texture_handle
            .clone()
            .unwrap()
    };

    let id = loader
        .submit(
            vec![Request::sprite(
                "s1",
                SpriteParams {
                    texture: SpriteTextureRef::Object(texture_handle),
                    x: 0.0,
                    y: 0.0,
                    w: 32.0,
                    h: 32.0,
                    anchor_x: None,
                    anchor_y: None,
                    collision_a: 0.0,
                    collision_b: 0.0,
                    is_rect: true,
                },
            )],
            false,
            None,
        )
        .unwrap();
    wait_for(&loader, || loader.task(id).unwrap().is_completed());

    let result = loader.task(id).unwrap().results()[0].clone().unwrap();
    assert!(result.success);
    assert!(result.sprite_handle.is_some());
}

#[test]
fn worker_never_touches_device_or_audio_engine() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new()
        .with_file("a.png", vec![1, 2, 3, 4])
        .with_file("b.ogg", vec![1, 2, 3, 4]);
    let device = Arc::new(FakeDevice::new());
    let audio_engine = Arc::new(FakeAudioEngine::new());
    let collab = Collaborators {
        file_system: Arc::new(fs),
        image_decoder: Arc::new(FakeImageDecoder),
        audio_decoder_factory: Arc::new(FakeAudioDecoderFactory),
        device: device.clone(),
        audio_engine: audio_engine.clone(),
        active_pool: Arc::new(FakeActivePoolProvider::new(Some(pool.clone()))),
    };
    let loader = Loader::new(LoaderConfig::default(), collab);
    let pump_thread = std::thread::current().id();

    let id = loader
        .submit(
            vec![
                Request::texture(
                    "t1",
                    TextureParams {
                        path: "a.png".into(),
                        enable_mipmaps: false,
                        width: 0,
                        height: 0,
                    },
                ),
                Request::music(
                    "bgm",
                    MusicParams {
                        path: "b.ogg".into(),
                        loop_start: 0.0,
                        loop_end: 0.0,
                        stream: false,
                    },
                ),
            ],
            true,
            None,
        )
        .unwrap();

    wait_for(&loader, || loader.task(id).unwrap().is_completed());
    let task = loader.task(id).unwrap();
    assert!(task.results().iter().all(|r| r.as_ref().unwrap().success));

    // Every device/audio-engine call must have happened on this thread (the
    // pump), never on a worker thread, per invariant 4.
    assert!(device.call_count() > 0);
    for id in device.calling_threads.lock().unwrap().iter() {
        assert_eq!(*id, pump_thread);
    }
    assert!(!audio_engine.calling_threads.lock().unwrap().is_empty());
    for id in audio_engine.calling_threads.lock().unwrap().iter() {
        assert_eq!(*id, pump_thread);
    }
}

#[test]
fn s4_cancellation_mid_stream_music_batch() {
    let pool = Arc::new(FakePool::new("global"));
    let mut fs = FakeFileSystem::new();
    for i in 0..10 {
        fs = fs.with_file(format!("m{i}.ogg"), vec![1, 2, 3, 4]);
    }
    let collab = Collaborators {
        file_system: Arc::new(fs),
        image_decoder: Arc::new(FakeImageDecoder),
        audio_decoder_factory: Arc::new(SlowFakeAudioDecoderFactory {
            delay: Duration::from_millis(20),
        }),
        device: Arc::new(FakeDevice::new()),
        audio_engine: Arc::new(FakeAudioEngine::new()),
        active_pool: Arc::new(FakeActivePoolProvider::new(Some(pool.clone()))),
    };
    let config = LoaderConfig {
        thread_count: 1,
        ..LoaderConfig::default()
    };
    let loader = Loader::new(config, collab);

    let requests = (0..10)
        .map(|i| {
            Request::music(
                format!("m{i}"),
                MusicParams {
                    path: format!("m{i}.ogg"),
                    loop_start: 0.0,
                    loop_end: 0.0,
                    stream: false,
                },
            )
        })
        .collect();
    let id = loader.submit(requests, true, None).unwrap();
    let task = loader.task(id).unwrap();

    // With one worker and a 20ms-per-item decoder, this window reliably
    // catches the batch partway through.
    std::thread::sleep(Duration::from_millis(45));
    loader.cancel(id);

    for _ in 0..200 {
        loader.update();
        if task.is_cancelled() {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    assert!(task.is_cancelled());
    assert!(task.completed() >= 1);
    assert!(task.completed() < 10);
    for i in 0..10 {
        assert!(!pool.contains(ResourceKind::Music, &format!("m{i}")));
    }
}

#[test]
fn s6_sprite_batch_handle_mode_caches_three_sprites() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new();
    let loader = Loader::new(LoaderConfig::default(), collaborators_with(fs, pool));

    let texture_handle = {
        let id = loader
            .submit(
                vec![Request::texture(
                    "tex",
                    TextureParams {
                        path: String::new(),
                        enable_mipmaps: false,
                        width: 32,
                        height: 32,
                    },
                )],
                false,
                None,
            )
            .unwrap();
        wait_for(&loader, || loader.task(id).unwrap().is_completed());
        loader.task(id).unwrap().results()[0]
            .as_ref()
            .unwrap()
            .texture_handle
            .clone()
            .unwrap()
    };

    let requests = (0..3)
        .map(|i| {
            Request::sprite(
                format!("s{i}"),
                SpriteParams {
                    texture: SpriteTextureRef::Object(texture_handle.clone()),
                    x: i as f64 * 32.0,
                    y: 0.0,
                    w: 32.0,
                    h: 32.0,
                    anchor_x: Some(16.0),
                    anchor_y: Some(16.0),
                    collision_a: 0.0,
                    collision_b: 0.0,
                    is_rect: true,
                },
            )
        })
        .collect();
    let id = loader.submit(requests, false, None).unwrap();
    wait_for(&loader, || loader.task(id).unwrap().is_completed());

    let batch = SpriteBatchHandle::new(loader.task(id).unwrap());
    let first = batch.get_sprites();
    let second = batch.get_sprites();
    assert_eq!(first.len(), 3);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn texture_batch_handle_caches_after_completion() {
    let pool = Arc::new(FakePool::new("global"));
    let fs = FakeFileSystem::new();
    let loader = Loader::new(LoaderConfig::default(), collaborators_with(fs, pool));

    let id = loader
        .submit(
            vec![Request::texture(
                "blank",
                TextureParams {
                    path: String::new(),
                    enable_mipmaps: false,
                    width: 8,
                    height: 8,
                },
            )],
            false,
            None,
        )
        .unwrap();
    wait_for(&loader, || loader.task(id).unwrap().is_completed());

    let batch = TextureBatchHandle::new(loader.task(id).unwrap());
    let first = batch.get_textures();
    let second = batch.get_textures();
    assert_eq!(first.len(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}
