//! The per-request result record (§3 "Result"). Carries either a failure
//! message or the decoded intermediate that the pump will finalize into a
//! GPU/audio object.

use std::sync::Arc;

use crate::collab::decoders::{AudioDecoder, DecodedImage};
use crate::collab::device::{SpriteHandle, TextureHandle};
use crate::error::LoaderError;
use crate::request::{Request, ResourceKind};

/// The decoded intermediate a worker hands off to the pump. Exactly one of
/// these (or `None`) is populated depending on kind and code path.
#[derive(Clone)]
pub enum Intermediate {
    None,
    Image(Arc<dyn DecodedImage>),
    /// Raw bytes for container-format files the device must ingest itself
    /// (e.g. DDS) -- see the open question in `spec.md` §9.
    RawBytes(Vec<u8>),
    AudioDecoder(Arc<dyn AudioDecoder>),
    Texture(TextureHandle),
    Sprite(SpriteHandle),
}

impl std::fmt::Debug for Intermediate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intermediate::None => f.write_str("None"),
            Intermediate::Image(_) => f.write_str("Image(..)"),
            Intermediate::RawBytes(b) => write!(f, "RawBytes({} bytes)", b.len()),
            Intermediate::AudioDecoder(_) => f.write_str("AudioDecoder(..)"),
            Intermediate::Texture(_) => f.write_str("Texture(..)"),
            Intermediate::Sprite(_) => f.write_str("Sprite(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadResult {
    pub name: String,
    pub kind: ResourceKind,
    pub success: bool,
    pub error_message: String,
    pub registered_to_pool: bool,
    pub intermediate: Intermediate,
    pub needs_mipmap_generation: bool,
    /// `false` = pure-CPU resource; the pump processes these with no
    /// per-frame limit. `true` = GPU resource, throttled by the quota.
    pub requires_gpu: bool,
    /// Anonymous handle-mode results (textures and sprites only).
    pub texture_handle: Option<TextureHandle>,
    pub sprite_handle: Option<SpriteHandle>,
}

impl LoadResult {
    /// Mirrors the original's `InitWorkerResult`: a blank, in-flight result
    /// stamped with the request's identity.
    pub fn pending(request: &Request, requires_gpu: bool) -> Self {
        Self {
            name: request.name.clone(),
            kind: request.kind(),
            success: false,
            error_message: String::new(),
            registered_to_pool: false,
            intermediate: Intermediate::None,
            needs_mipmap_generation: false,
            requires_gpu,
            texture_handle: None,
            sprite_handle: None,
        }
    }

    pub fn fail(mut self, err: LoaderError) -> Self {
        self.success = false;
        self.error_message = err.message();
        self
    }

    pub fn fail_msg(mut self, message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = message.into();
        self
    }

    pub fn succeed(mut self) -> Self {
        self.success = true;
        self
    }
}
