//! Handle-return mode (§4.5/§6): when a task isn't targeted at a resource
//! pool, finalized textures/sprites are handed back directly as opaque
//! handles instead of being registered under a name. These wrappers
//! memoize the first successful read so repeated calls don't re-walk the
//! task's result vector.

use std::sync::{Arc, OnceLock};

use crate::collab::device::{SpriteHandle, TextureHandle};
use crate::task::Task;

/// A lazily-materialized, cached view over a task's texture results.
pub struct TextureBatchHandle {
    task: Arc<Task>,
    cache: OnceLock<Arc<[TextureHandle]>>,
}

impl TextureBatchHandle {
    pub fn new(task: Arc<Task>) -> Self {
        Self {
            task,
            cache: OnceLock::new(),
        }
    }

    /// Returns every texture handle finalized so far, in request order.
    /// Only populated once the backing task is completed; call again after
    /// the task finishes to pick up late results.
    pub fn get_textures(&self) -> Arc<[TextureHandle]> {
        if self.task.is_completed() {
            if let Some(cached) = self.cache.get() {
                return cached.clone();
            }
        }

        let textures: Vec<TextureHandle> = self
            .task
            .results()
            .into_iter()
            .flatten()
            .filter(|r| r.success)
            .filter_map(|r| r.texture_handle)
            .collect();
        let textures: Arc<[TextureHandle]> = textures.into();

        if self.task.is_completed() {
            let _ = self.cache.set(textures.clone());
        }
        textures
    }
}

pub struct SpriteBatchHandle {
    task: Arc<Task>,
    cache: OnceLock<Arc<[SpriteHandle]>>,
}

impl SpriteBatchHandle {
    pub fn new(task: Arc<Task>) -> Self {
        Self {
            task,
            cache: OnceLock::new(),
        }
    }

    pub fn get_sprites(&self) -> Arc<[SpriteHandle]> {
        if self.task.is_completed() {
            if let Some(cached) = self.cache.get() {
                return cached.clone();
            }
        }

        let sprites: Vec<SpriteHandle> = self
            .task
            .results()
            .into_iter()
            .flatten()
            .filter(|r| r.success)
            .filter_map(|r| r.sprite_handle)
            .collect();
        let sprites: Arc<[SpriteHandle]> = sprites.into();

        if self.task.is_completed() {
            let _ = self.cache.set(sprites.clone());
        }
        sprites
    }
}
