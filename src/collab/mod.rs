//! Trait contracts for every external collaborator named in `spec.md` §1's
//! "explicitly out of scope" list. The loader depends on these traits only
//! -- it never assumes a concrete file system, decoder, graphics device,
//! audio engine, or resource pool implementation.

pub mod active_pool;
pub mod audio;
pub mod decoders;
pub mod device;
pub mod file_system;
pub mod pool;

pub use active_pool::ActivePoolProvider;
pub use audio::AudioEngine;
pub use decoders::{AudioDecoder, ImageDecoder};
pub use device::GraphicsDevice;
pub use file_system::FileSystem;
pub use pool::ResourcePool;

use std::sync::Arc;

/// Bundles the collaborators a [`crate::loader::Loader`] is constructed
/// with. Each is a trait object so the embedding application supplies its
/// own file system / decoders / device / audio engine / active-pool
/// tracking.
#[derive(Clone)]
pub struct Collaborators {
    pub file_system: Arc<dyn FileSystem>,
    pub image_decoder: Arc<dyn ImageDecoder>,
    pub audio_decoder_factory: Arc<dyn decoders::AudioDecoderFactory>,
    pub device: Arc<dyn GraphicsDevice>,
    pub audio_engine: Arc<dyn AudioEngine>,
    pub active_pool: Arc<dyn ActivePoolProvider>,
}
