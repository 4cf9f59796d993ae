//! Decoder collaborators (`spec.md` §1: "Image, audio, font, model,
//! shader, and particle decoders — exposes `decode(bytes) → decoded asset
//! | error`"). Only images and audio need a CPU-side decode step in this
//! core; the remaining kinds are composed from other resources and only
//! need path validation on the worker (`spec.md` §4.3), with the real
//! build deferred to finalize.

use std::fmt;
use std::sync::Arc;

use crate::error::LoaderError;

/// A decoded in-memory image surface, ready for the main thread to upload
/// to the graphics device.
pub trait DecodedImage: Send + Sync + fmt::Debug {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

pub trait ImageDecoder: Send + Sync {
    /// Decodes an in-memory image. Returns `Err` on malformed input.
    fn decode(&self, bytes: &[u8]) -> Result<Arc<dyn DecodedImage>, LoaderError>;
}

/// A CPU-side audio decoder handle, created by the worker and bound to a
/// player only later, on the main thread (`spec.md` §4.3).
pub trait AudioDecoder: Send + Sync {
    fn sample_rate(&self) -> u32;
    fn frame_count(&self) -> u64;
}

pub trait AudioDecoderFactory: Send + Sync {
    fn create(&self, path: &str, bytes: &[u8]) -> Result<Arc<dyn AudioDecoder>, LoaderError>;
}

/// The default [`ImageDecoder`] implementation, backed by the `image`
/// crate (the same crate `material_loader.rs` uses for PBR texture
/// loading). This is provided for convenience; the core crate does not
/// require it and any embedder may supply their own.
pub struct ImageCrateDecoder;

#[derive(Debug)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl DecodedImage for RgbaImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Arc<dyn DecodedImage>, LoaderError> {
        let img = image::load_from_memory(bytes).map_err(|e| LoaderError::DecodeError {
            kind: "Image",
            message: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        Ok(Arc::new(RgbaImage {
            width,
            height,
            pixels: rgba.into_raw(),
        }))
    }
}

/// The leading four bytes of a DDS container file ("DDS ", `spec.md` §6).
pub const DDS_MAGIC: [u8; 4] = [0x44, 0x44, 0x53, 0x20];

/// Returns true when `data` begins with the DDS container magic.
pub fn is_container_format(data: &[u8]) -> bool {
    data.len() >= 4 && data[0..4] == DDS_MAGIC
}
