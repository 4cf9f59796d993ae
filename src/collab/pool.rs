//! The resource-pool interface contract (`spec.md` §4.6): what the loader
//! requires of the external pool type, and what it promises in return.
//!
//! All methods here are main-thread-only -- they are only ever called from
//! [`crate::pump`]. Lookup-by-name returns a strong reference
//! ([`SpriteHandle`]/[`Arc<dyn AudioDecoder>`]-shaped) that the loader
//! retains across finalize calls, per the contract's "must retain it
//! across finalize calls" clause.

use std::sync::Arc;

use crate::collab::audio::AudioPlayerHandle;
use crate::collab::decoders::AudioDecoder;
use crate::collab::device::{SpriteHandle, TextureHandle};
use crate::error::LoaderError;
use crate::request::ResourceKind;

pub type PoolRef = Arc<dyn ResourcePool>;

/// A named mapping from resource name to a strongly-typed resource entry
/// (`spec.md` §1: "Resource pool containers").
pub trait ResourcePool: Send + Sync {
    fn name(&self) -> &str;

    fn contains(&self, kind: ResourceKind, name: &str) -> bool;

    // -- internal-entry insertion: the loader already holds the
    // device/audio object and only needs the pool to register it. --

    fn insert_texture_entry(&self, name: &str, texture: TextureHandle) -> Result<(), LoaderError>;

    fn insert_music_entry(
        &self,
        name: &str,
        decoder: Arc<dyn AudioDecoder>,
        player: AudioPlayerHandle,
    ) -> Result<(), LoaderError>;

    fn insert_sound_effect_entry(
        &self,
        name: &str,
        player: AudioPlayerHandle,
    ) -> Result<(), LoaderError>;

    // -- load_*/create_* families driven entirely by the pool (container
    // files, blank textures, and composed kinds the pool knows how to
    // build on its own). --

    fn load_texture(&self, name: &str, path: &str, mipmaps: bool) -> Result<(), LoaderError>;

    fn create_texture(&self, name: &str, width: i32, height: i32) -> Result<(), LoaderError>;

    fn create_sprite(
        &self,
        name: &str,
        texture_name: &str,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        collision_a: f64,
        collision_b: f64,
        is_rect: bool,
    ) -> Result<(), LoaderError>;

    fn find_sprite(&self, name: &str) -> Option<SpriteHandle>;

    fn set_sprite_center(&self, sprite: &SpriteHandle, x: f32, y: f32) -> Result<(), LoaderError>;

    fn create_animation_from_texture(
        &self,
        name: &str,
        texture_name: &str,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        n: u32,
        m: u32,
        interval: u32,
        collision_a: f64,
        collision_b: f64,
        is_rect: bool,
    ) -> Result<(), LoaderError>;

    fn create_animation_from_sprites(
        &self,
        name: &str,
        sprites: &[SpriteHandle],
        interval: u32,
        collision_a: f64,
        collision_b: f64,
        is_rect: bool,
    ) -> Result<(), LoaderError>;

    fn load_sprite_font(
        &self,
        name: &str,
        path: &str,
        companion_texture_path: Option<&str>,
        mipmaps: bool,
    ) -> Result<(), LoaderError>;

    fn load_true_type_font(
        &self,
        name: &str,
        path: &str,
        width: f32,
        height: f32,
    ) -> Result<(), LoaderError>;

    fn load_effect(&self, name: &str, path: &str) -> Result<(), LoaderError>;

    fn load_model(&self, name: &str, path: &str) -> Result<(), LoaderError>;

    fn load_particle(
        &self,
        name: &str,
        path: &str,
        image_name: &str,
        collision_a: f64,
        collision_b: f64,
        is_rect: bool,
    ) -> Result<(), LoaderError>;
}
