//! In-memory fake collaborators for the test suite. Not part of the public
//! API surface an embedder depends on for production use -- only compiled
//! under `cfg(test)` or the `testing` feature so integration tests in
//! `tests/` can reach them too.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;

use crate::collab::active_pool::ActivePoolProvider;
use crate::collab::audio::{AudioEngine, AudioPlayerHandle, MixChannel};
use crate::collab::decoders::{AudioDecoder, AudioDecoderFactory, DecodedImage, ImageDecoder};
use crate::collab::device::{GraphicsDevice, SpriteGeometry, SpriteHandle, TextureHandle};
use crate::collab::file_system::FileSystem;
use crate::collab::pool::ResourcePool;
use crate::error::LoaderError;
use crate::request::ResourceKind;

/// An in-memory "file system" backed by a name -> bytes map.
#[derive(Default)]
pub struct FakeFileSystem {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.lock().expect("lock poisoned").insert(path.into(), bytes);
        self
    }
}

impl FileSystem for FakeFileSystem {
    fn open_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().expect("lock poisoned").get(path).cloned()
    }
}

#[derive(Debug)]
pub struct FakeImage {
    width: u32,
    height: u32,
}

impl DecodedImage for FakeImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Decodes any non-empty byte slice into a fixed-size fake image; empty
/// input is treated as malformed, for exercising decode-failure paths.
pub struct FakeImageDecoder;

impl ImageDecoder for FakeImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Arc<dyn DecodedImage>, LoaderError> {
        if bytes.is_empty() {
            return Err(LoaderError::DecodeError {
                kind: "Image",
                message: "empty buffer".into(),
            });
        }
        Ok(Arc::new(FakeImage {
            width: 64,
            height: 64,
        }))
    }
}

pub struct FakeAudioDecoder {
    sample_rate: u32,
    frame_count: u64,
}

impl AudioDecoder for FakeAudioDecoder {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

pub struct FakeAudioDecoderFactory;

impl AudioDecoderFactory for FakeAudioDecoderFactory {
    fn create(&self, _path: &str, bytes: &[u8]) -> Result<Arc<dyn AudioDecoder>, LoaderError> {
        if bytes.is_empty() {
            return Err(LoaderError::DecodeError {
                kind: "Audio",
                message: "empty buffer".into(),
            });
        }
        Ok(Arc::new(FakeAudioDecoder {
            sample_rate: 44_100,
            frame_count: 44_100 * 4,
        }))
    }
}

/// Like [`FakeAudioDecoderFactory`], but sleeps before returning -- for
/// exercising cancellation mid-batch, where the worker must be caught with
/// a request actually in flight.
pub struct SlowFakeAudioDecoderFactory {
    pub delay: std::time::Duration,
}

impl AudioDecoderFactory for SlowFakeAudioDecoderFactory {
    fn create(&self, path: &str, bytes: &[u8]) -> Result<Arc<dyn AudioDecoder>, LoaderError> {
        std::thread::sleep(self.delay);
        FakeAudioDecoderFactory.create(path, bytes)
    }
}

/// Records the [`ThreadId`] of every call it receives, so tests can assert
/// invariant 4 ("workers never touch the device") by checking every call
/// happened on the pump's thread.
#[derive(Default)]
pub struct FakeDevice {
    pub calling_threads: Mutex<Vec<ThreadId>>,
    next_id: AtomicU64,
}

struct FakeResource(u64);

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self) -> u64 {
        self.calling_threads
            .lock()
            .expect("lock poisoned")
            .push(std::thread::current().id());
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn call_count(&self) -> usize {
        self.calling_threads.lock().expect("lock poisoned").len()
    }
}

impl GraphicsDevice for FakeDevice {
    fn create_texture_from_image(
        &self,
        _image: &Arc<dyn DecodedImage>,
        _generate_mipmaps: bool,
    ) -> Result<TextureHandle, LoaderError> {
        Ok(TextureHandle(Arc::new(FakeResource(self.record())) as Arc<dyn Any + Send + Sync>))
    }

    fn create_texture_from_container_file(
        &self,
        _path: &str,
        _generate_mipmaps: bool,
    ) -> Result<TextureHandle, LoaderError> {
        Ok(TextureHandle(Arc::new(FakeResource(self.record())) as Arc<dyn Any + Send + Sync>))
    }

    fn create_blank_texture(&self, _width: i32, _height: i32) -> Result<TextureHandle, LoaderError> {
        Ok(TextureHandle(Arc::new(FakeResource(self.record())) as Arc<dyn Any + Send + Sync>))
    }

    fn create_sprite_from_texture(
        &self,
        _texture: &TextureHandle,
        _geometry: SpriteGeometry,
    ) -> Result<SpriteHandle, LoaderError> {
        Ok(SpriteHandle(Arc::new(FakeResource(self.record())) as Arc<dyn Any + Send + Sync>))
    }

    fn set_sprite_center(&self, _sprite: &SpriteHandle, _x: f32, _y: f32) -> Result<(), LoaderError> {
        self.record();
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAudioEngine {
    pub calling_threads: Mutex<Vec<ThreadId>>,
    next_id: AtomicU64,
}

impl FakeAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self) -> u64 {
        self.calling_threads
            .lock()
            .expect("lock poisoned")
            .push(std::thread::current().id());
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl AudioEngine for FakeAudioEngine {
    fn create_stream_player(
        &self,
        _decoder: &Arc<dyn AudioDecoder>,
        _channel: MixChannel,
    ) -> Result<AudioPlayerHandle, LoaderError> {
        Ok(AudioPlayerHandle(Arc::new(FakeResource(self.record())) as Arc<dyn Any + Send + Sync>))
    }

    fn create_one_shot_player(
        &self,
        _decoder: &Arc<dyn AudioDecoder>,
        _channel: MixChannel,
    ) -> Result<AudioPlayerHandle, LoaderError> {
        Ok(AudioPlayerHandle(Arc::new(FakeResource(self.record())) as Arc<dyn Any + Send + Sync>))
    }

    fn set_loop(&self, _player: &AudioPlayerHandle, _start: f64, _duration: f64) -> Result<(), LoaderError> {
        self.record();
        Ok(())
    }
}

enum FakeEntry {
    Texture(TextureHandle),
    Sprite(SpriteHandle),
    Music,
    SoundEffect,
    Other,
}

/// A minimal in-memory resource pool, enough to exercise every
/// `ResourcePool` method without a real engine behind it.
#[derive(Default)]
pub struct FakePool {
    name: String,
    entries: Mutex<HashMap<(ResourceKindKey, String), FakeEntry>>,
}

#[derive(PartialEq, Eq, Hash, Clone, Copy)]
enum ResourceKindKey {
    Texture,
    Sprite,
    Animation,
    Music,
    SoundEffect,
    SpriteFont,
    TrueTypeFont,
    Effect,
    Model,
    Particle,
}

impl From<ResourceKind> for ResourceKindKey {
    fn from(k: ResourceKind) -> Self {
        match k {
            ResourceKind::Texture => ResourceKindKey::Texture,
            ResourceKind::Sprite => ResourceKindKey::Sprite,
            ResourceKind::Animation => ResourceKindKey::Animation,
            ResourceKind::Music => ResourceKindKey::Music,
            ResourceKind::SoundEffect => ResourceKindKey::SoundEffect,
            ResourceKind::SpriteFont => ResourceKindKey::SpriteFont,
            ResourceKind::TrueTypeFont => ResourceKindKey::TrueTypeFont,
            ResourceKind::Effect => ResourceKindKey::Effect,
            ResourceKind::Model => ResourceKindKey::Model,
            ResourceKind::Particle => ResourceKindKey::Particle,
        }
    }
}

impl FakePool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl ResourcePool for FakePool {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        self.entries
            .lock()
            .expect("lock poisoned")
            .contains_key(&(kind.into(), name.to_string()))
    }

    fn insert_texture_entry(&self, name: &str, texture: TextureHandle) -> Result<(), LoaderError> {
        self.entries.lock().expect("lock poisoned").insert(
            (ResourceKindKey::Texture, name.to_string()),
            FakeEntry::Texture(texture),
        );
        Ok(())
    }

    fn insert_music_entry(
        &self,
        name: &str,
        _decoder: Arc<dyn AudioDecoder>,
        _player: AudioPlayerHandle,
    ) -> Result<(), LoaderError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::Music, name.to_string()), FakeEntry::Music);
        Ok(())
    }

    fn insert_sound_effect_entry(&self, name: &str, _player: AudioPlayerHandle) -> Result<(), LoaderError> {
        self.entries.lock().expect("lock poisoned").insert(
            (ResourceKindKey::SoundEffect, name.to_string()),
            FakeEntry::SoundEffect,
        );
        Ok(())
    }

    fn load_texture(&self, name: &str, _path: &str, _mipmaps: bool) -> Result<(), LoaderError> {
        let handle = TextureHandle(Arc::new(0u64) as Arc<dyn Any + Send + Sync>);
        self.insert_texture_entry(name, handle)
    }

    fn create_texture(&self, name: &str, _width: i32, _height: i32) -> Result<(), LoaderError> {
        let handle = TextureHandle(Arc::new(0u64) as Arc<dyn Any + Send + Sync>);
        self.insert_texture_entry(name, handle)
    }

    fn create_sprite(
        &self,
        name: &str,
        _texture_name: &str,
        _x: f64,
        _y: f64,
        _w: f64,
        _h: f64,
        _collision_a: f64,
        _collision_b: f64,
        _is_rect: bool,
    ) -> Result<(), LoaderError> {
        let handle = SpriteHandle(Arc::new(0u64) as Arc<dyn Any + Send + Sync>);
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::Sprite, name.to_string()), FakeEntry::Sprite(handle));
        Ok(())
    }

    fn find_sprite(&self, name: &str) -> Option<SpriteHandle> {
        match self
            .entries
            .lock()
            .expect("lock poisoned")
            .get(&(ResourceKindKey::Sprite, name.to_string()))
        {
            Some(FakeEntry::Sprite(handle)) => Some(handle.clone()),
            _ => None,
        }
    }

    fn set_sprite_center(&self, _sprite: &SpriteHandle, _x: f32, _y: f32) -> Result<(), LoaderError> {
        Ok(())
    }

    fn create_animation_from_texture(
        &self,
        name: &str,
        _texture_name: &str,
        _x: f64,
        _y: f64,
        _w: f64,
        _h: f64,
        _n: u32,
        _m: u32,
        _interval: u32,
        _collision_a: f64,
        _collision_b: f64,
        _is_rect: bool,
    ) -> Result<(), LoaderError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::Animation, name.to_string()), FakeEntry::Other);
        Ok(())
    }

    fn create_animation_from_sprites(
        &self,
        name: &str,
        _sprites: &[SpriteHandle],
        _interval: u32,
        _collision_a: f64,
        _collision_b: f64,
        _is_rect: bool,
    ) -> Result<(), LoaderError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::Animation, name.to_string()), FakeEntry::Other);
        Ok(())
    }

    fn load_sprite_font(
        &self,
        name: &str,
        _path: &str,
        _companion_texture_path: Option<&str>,
        _mipmaps: bool,
    ) -> Result<(), LoaderError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::SpriteFont, name.to_string()), FakeEntry::Other);
        Ok(())
    }

    fn load_true_type_font(&self, name: &str, _path: &str, _width: f32, _height: f32) -> Result<(), LoaderError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::TrueTypeFont, name.to_string()), FakeEntry::Other);
        Ok(())
    }

    fn load_effect(&self, name: &str, _path: &str) -> Result<(), LoaderError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::Effect, name.to_string()), FakeEntry::Other);
        Ok(())
    }

    fn load_model(&self, name: &str, _path: &str) -> Result<(), LoaderError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::Model, name.to_string()), FakeEntry::Other);
        Ok(())
    }

    fn load_particle(
        &self,
        name: &str,
        _path: &str,
        _image_name: &str,
        _collision_a: f64,
        _collision_b: f64,
        _is_rect: bool,
    ) -> Result<(), LoaderError> {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert((ResourceKindKey::Particle, name.to_string()), FakeEntry::Other);
        Ok(())
    }
}

pub struct FakeActivePoolProvider {
    pool: Mutex<Option<Arc<dyn ResourcePool>>>,
}

impl FakeActivePoolProvider {
    pub fn new(pool: Option<Arc<dyn ResourcePool>>) -> Self {
        Self {
            pool: Mutex::new(pool),
        }
    }
}

impl ActivePoolProvider for FakeActivePoolProvider {
    fn current(&self) -> Option<Arc<dyn ResourcePool>> {
        self.pool.lock().expect("lock poisoned").clone()
    }
}
