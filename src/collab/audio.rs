//! The audio engine collaborator (`spec.md` §1: "`createStreamPlayer`,
//! `createOneShotPlayer`" -- main-thread-only).

use std::any::Any;
use std::sync::Arc;

use crate::collab::decoders::AudioDecoder;
use crate::error::LoaderError;

/// The two mix channels this core names (`spec.md` §6's GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixChannel {
    Music,
    SoundEffect,
}

#[derive(Clone)]
pub struct AudioPlayerHandle(pub Arc<dyn Any + Send + Sync>);

impl std::fmt::Debug for AudioPlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AudioPlayerHandle(..)")
    }
}

pub trait AudioEngine: Send + Sync {
    /// Creates a player that streams from `decoder` rather than fully
    /// decoding it up front.
    fn create_stream_player(
        &self,
        decoder: &Arc<dyn AudioDecoder>,
        channel: MixChannel,
    ) -> Result<AudioPlayerHandle, LoaderError>;

    /// Creates a player bound to a fully-decoded buffer, or a one-shot
    /// (non-looping by default) player for sound effects.
    fn create_one_shot_player(
        &self,
        decoder: &Arc<dyn AudioDecoder>,
        channel: MixChannel,
    ) -> Result<AudioPlayerHandle, LoaderError>;

    /// Enables looping over `[start, end)` seconds on an existing player.
    fn set_loop(
        &self,
        player: &AudioPlayerHandle,
        start_seconds: f64,
        duration_seconds: f64,
    ) -> Result<(), LoaderError>;
}
