//! The graphics device collaborator (`spec.md` §1: "exposes
//! `createTextureFromImage`, `createTextureFromContainerFile`" -- both
//! main-thread-only). Handles are opaque to the loader: it never
//! interprets the bytes behind them, only passes them back to the pool or
//! to the caller.

use std::any::Any;
use std::sync::Arc;

use crate::collab::decoders::DecodedImage;
use crate::error::LoaderError;

/// An opaque, cheaply cloned reference to a device-owned texture.
#[derive(Clone)]
pub struct TextureHandle(pub Arc<dyn Any + Send + Sync>);

impl std::fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TextureHandle(..)")
    }
}

/// An opaque, cheaply cloned reference to a device-owned sprite.
#[derive(Clone)]
pub struct SpriteHandle(pub Arc<dyn Any + Send + Sync>);

impl std::fmt::Debug for SpriteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SpriteHandle(..)")
    }
}

/// Rectangle + anchor describing how a sprite samples a texture.
#[derive(Debug, Clone, Copy)]
pub struct SpriteGeometry {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub center_x: f32,
    pub center_y: f32,
}

/// Single-owner, main-thread-only GPU device. Workers never hold a
/// reference to this trait (`spec.md` §5's single-owner invariant).
pub trait GraphicsDevice: Send + Sync {
    fn create_texture_from_image(
        &self,
        image: &Arc<dyn DecodedImage>,
        generate_mipmaps: bool,
    ) -> Result<TextureHandle, LoaderError>;

    /// Ingests a container-format (e.g. DDS) texture file. Per `spec.md`
    /// §9's preserved open question, this re-reads `path` from disk rather
    /// than taking the worker's already-read bytes.
    fn create_texture_from_container_file(
        &self,
        path: &str,
        generate_mipmaps: bool,
    ) -> Result<TextureHandle, LoaderError>;

    fn create_blank_texture(&self, width: i32, height: i32) -> Result<TextureHandle, LoaderError>;

    fn create_sprite_from_texture(
        &self,
        texture: &TextureHandle,
        geometry: SpriteGeometry,
    ) -> Result<SpriteHandle, LoaderError>;

    /// Overwrites a previously created sprite's texture-center anchor.
    fn set_sprite_center(&self, sprite: &SpriteHandle, x: f32, y: f32) -> Result<(), LoaderError>;
}
