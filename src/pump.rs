//! The completion pump (§4.4): drains finished decodes and finalizes them
//! on the calling (main) thread, throttling GPU-touching items to
//! `max_gpu_items_per_frame` per call while letting CPU-only items (audio)
//! through uncapped.

use std::collections::VecDeque;

use log::{trace, warn};

use crate::collab::audio::MixChannel;
use crate::collab::device::SpriteGeometry;
use crate::collab::pool::PoolRef;
use crate::collab::Collaborators;
use crate::error::LoaderError;
use crate::request::{AnimationSource, RequestPayload, SpriteTextureRef};
use crate::result::{Intermediate, LoadResult};
use crate::worker::CompletionEntry;

/// Runs one pump pass over `entries`, finalizing as many GPU-bound entries
/// as `max_gpu_items_per_frame` allows (CPU-only entries are never
/// throttled) and returning whatever didn't fit back to the caller so it
/// can be retried on the next pass. This is the "peek-then-commit" rule:
/// an item is only popped from the front once it's known to fit in the
/// remaining quota, which preserves FIFO order across quota stalls.
pub fn run_once(
    entries: &mut VecDeque<CompletionEntry>,
    collab: &Collaborators,
    max_gpu_items_per_frame: usize,
) {
    let mut gpu_budget = max_gpu_items_per_frame;

    while let Some(front) = entries.front() {
        if front.result.requires_gpu && gpu_budget == 0 {
            // Quota exhausted for this pass; leave the rest for next time,
            // preserving order.
            break;
        }
        let spends_gpu = front.result.requires_gpu;
        let entry = entries.pop_front().expect("front already peeked");
        finalize(entry, collab);
        if spends_gpu {
            gpu_budget -= 1;
        }
    }
}

fn finalize(entry: CompletionEntry, collab: &Collaborators) {
    let CompletionEntry {
        task,
        index,
        result,
    } = entry;

    if !result.success {
        trace!(
            "finalize: {} ({}) already failed in decode: {}",
            result.name,
            result.kind.as_str(),
            result.error_message
        );
        task.set_result(index, result);
        task.increment_completed();
        return;
    }

    if task.is_cancelled() {
        // Drained but cancellation-inert: record the decode outcome
        // without touching the device or publishing into a pool.
        trace!(
            "finalize: {} ({}) dropped, task cancelled",
            result.name,
            result.kind.as_str()
        );
        task.set_result(index, result);
        task.increment_completed();
        return;
    }

    let uses_pool = task.uses_pool();
    let request = &task.requests()[index];
    // A per-request override takes precedence over the task's default
    // target pool (`GetTargetResourcePool`, `AsyncResourceLoader.cpp:557-567`:
    // `request.target_pool ? request.target_pool : task->GetTargetPool()`).
    let pool = if uses_pool {
        request.target_pool.clone().or_else(|| task.target_pool().cloned())
    } else {
        None
    };

    let final_result = match result.kind {
        crate::request::ResourceKind::Texture => finalize_texture(result, request, collab, pool.as_ref()),
        crate::request::ResourceKind::Sprite => finalize_sprite(result, request, collab, pool.as_ref()),
        crate::request::ResourceKind::Animation => finalize_animation(result, request, pool.as_ref()),
        crate::request::ResourceKind::Music => finalize_music(result, request, uses_pool, collab, pool.as_ref()),
        crate::request::ResourceKind::SoundEffect => {
            finalize_sound_effect(result, uses_pool, collab, pool.as_ref())
        }
        crate::request::ResourceKind::SpriteFont => {
            finalize_sprite_font(result, request, uses_pool, pool.as_ref())
        }
        crate::request::ResourceKind::TrueTypeFont => {
            finalize_true_type_font(result, request, uses_pool, pool.as_ref())
        }
        crate::request::ResourceKind::Effect => finalize_effect(result, request, uses_pool, pool.as_ref()),
        crate::request::ResourceKind::Model => finalize_model(result, request, uses_pool, pool.as_ref()),
        crate::request::ResourceKind::Particle => finalize_particle(result, request, uses_pool, pool.as_ref()),
    };

    if !final_result.success {
        warn!(
            "finalize failed for {} ({}): {}",
            final_result.name,
            final_result.kind.as_str(),
            final_result.error_message
        );
    }

    task.set_result(index, final_result);
    task.increment_completed();
}

fn no_pool_err() -> LoaderError {
    LoaderError::DependencyMissing("no target resource pool for this request".into())
}

/// The handle-mode ("modern API") path some kinds simply don't have, per
/// the original's `else` branch in each `CompleteXxx` function (e.g.
/// `AsyncResourceLoader.cpp:1159-1163`, `:1207-1212`). Distinct from
/// [`no_pool_err`], which fires when pool mode is in effect but no pool
/// could be resolved.
fn unsupported_handle_mode(kind: &str) -> LoaderError {
    LoaderError::Unsupported(format!("Modern API {kind} loading not implemented in async loader"))
}

fn finalize_texture(
    mut result: LoadResult,
    request: &crate::request::Request,
    collab: &Collaborators,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::Texture(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter("not a texture request".into()));
    };

    let handle_result = match &result.intermediate {
        Intermediate::Image(img) => collab
            .device
            .create_texture_from_image(img, result.needs_mipmap_generation),
        // Container-format textures are re-read from disk by the device
        // itself (preserved open question, SPEC_FULL §9).
        Intermediate::RawBytes(_) => collab
            .device
            .create_texture_from_container_file(&params.path, result.needs_mipmap_generation),
        Intermediate::None => collab
            .device
            .create_blank_texture(params.width, params.height),
        _ => Err(LoaderError::InvalidParameter(
            "texture result missing an intermediate".into(),
        )),
    };

    match handle_result {
        Ok(handle) => {
            result.texture_handle = Some(handle.clone());
            if let Some(pool) = pool {
                match pool.insert_texture_entry(&result.name, handle) {
                    Ok(()) => result.registered_to_pool = true,
                    Err(e) => return result.fail(e),
                }
            }
            result.succeed()
        }
        Err(e) => result.fail(e),
    }
}

fn finalize_sprite(
    mut result: LoadResult,
    request: &crate::request::Request,
    collab: &Collaborators,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::Sprite(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter("not a sprite request".into()));
    };

    // Anchor defaults to half the sprite's extent when not given, matching
    // the original's `anchor_x.has_value()` check (SPEC_FULL §4.1).
    let center_x = params.anchor_x.unwrap_or(params.w * 0.5) as f32;
    let center_y = params.anchor_y.unwrap_or(params.h * 0.5) as f32;
    let geometry = SpriteGeometry {
        x: params.x as f32,
        y: params.y as f32,
        w: params.w as f32,
        h: params.h as f32,
        center_x,
        center_y,
    };

    match &params.texture {
        SpriteTextureRef::Object(texture) => match collab.device.create_sprite_from_texture(texture, geometry) {
            Ok(sprite) => {
                result.sprite_handle = Some(sprite);
                result.succeed()
            }
            Err(e) => result.fail(e),
        },
        SpriteTextureRef::Named(texture_name) => {
            let Some(pool) = pool else {
                return result.fail(no_pool_err());
            };
            match pool.create_sprite(
                &result.name,
                texture_name,
                params.x,
                params.y,
                params.w,
                params.h,
                params.collision_a,
                params.collision_b,
                params.is_rect,
            ) {
                Ok(()) => {
                    if let (Some(anchor_x), Some(anchor_y)) = (params.anchor_x, params.anchor_y) {
                        if let Some(sprite) = pool.find_sprite(&result.name) {
                            if let Err(e) = pool.set_sprite_center(&sprite, anchor_x as f32, anchor_y as f32) {
                                return result.fail(e);
                            }
                        }
                    }
                    result.registered_to_pool = true;
                    result.succeed()
                }
                Err(e) => result.fail(e),
            }
        }
    }
}

fn finalize_animation(
    mut result: LoadResult,
    request: &crate::request::Request,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::Animation(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter("not an animation request".into()));
    };
    let Some(pool) = pool else {
        return result.fail(no_pool_err());
    };

    let outcome = match &params.source {
        AnimationSource::FromTexture {
            texture_name,
            x,
            y,
            w,
            h,
            n,
            m,
            interval,
        } => pool.create_animation_from_texture(
            &result.name,
            texture_name,
            *x,
            *y,
            *w,
            *h,
            *n,
            *m,
            *interval,
            params.collision_a,
            params.collision_b,
            params.is_rect,
        ),
        AnimationSource::FromSprites(names) => {
            let mut sprites = Vec::with_capacity(names.len());
            for name in names {
                match pool.find_sprite(name) {
                    Some(sprite) => sprites.push(sprite),
                    None => {
                        return result.fail(LoaderError::DependencyMissing(format!(
                            "sprite not found: {name}"
                        )));
                    }
                }
            }
            pool.create_animation_from_sprites(
                &result.name,
                &sprites,
                // interval is only meaningful per-texture in the original;
                // sprite-list animations reuse the first sprite's implicit
                // frame interval, which the pool itself owns.
                0,
                params.collision_a,
                params.collision_b,
                params.is_rect,
            )
        }
    };

    match outcome {
        Ok(()) => {
            result.registered_to_pool = true;
            result.succeed()
        }
        Err(e) => result.fail(e),
    }
}

fn finalize_music(
    mut result: LoadResult,
    request: &crate::request::Request,
    uses_pool: bool,
    collab: &Collaborators,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::Music(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter("not a music request".into()));
    };

    if !uses_pool {
        return result.fail(unsupported_handle_mode("music"));
    }

    // Idempotency: check existence before touching the audio engine at
    // all, matching `CompleteMusic`'s ordering (SPEC_FULL §11).
    if let Some(pool) = pool {
        if pool.contains(crate::request::ResourceKind::Music, &result.name) {
            result.registered_to_pool = true;
            return result.succeed();
        }
    } else {
        return result.fail(no_pool_err());
    }

    let Intermediate::AudioDecoder(decoder) = &result.intermediate else {
        return result.fail(LoaderError::InvalidParameter(
            "music result missing a decoder".into(),
        ));
    };

    let player = if params.stream {
        collab.audio_engine.create_stream_player(decoder, MixChannel::Music)
    } else {
        collab.audio_engine.create_one_shot_player(decoder, MixChannel::Music)
    };

    let player = match player {
        Ok(player) => player,
        Err(e) => return result.fail(e),
    };

    let loop_end = if params.loop_end > params.loop_start {
        params.loop_end
    } else {
        decoder.frame_count() as f64 / decoder.sample_rate().max(1) as f64
    };

    if let Err(e) = collab
        .audio_engine
        .set_loop(&player, params.loop_start, loop_end - params.loop_start)
    {
        return result.fail(e);
    }

    if let Some(pool) = pool {
        if let Err(e) = pool.insert_music_entry(&result.name, decoder.clone(), player) {
            return result.fail(e);
        }
        result.registered_to_pool = true;
    }

    result.succeed()
}

fn finalize_sound_effect(
    mut result: LoadResult,
    uses_pool: bool,
    collab: &Collaborators,
    pool: Option<&PoolRef>,
) -> LoadResult {
    if !uses_pool {
        return result.fail(unsupported_handle_mode("sound effect"));
    }
    let Some(pool) = pool else {
        return result.fail(no_pool_err());
    };

    let Intermediate::AudioDecoder(decoder) = &result.intermediate else {
        return result.fail(LoaderError::InvalidParameter(
            "sound effect result missing a decoder".into(),
        ));
    };

    match collab.audio_engine.create_one_shot_player(decoder, MixChannel::SoundEffect) {
        Ok(player) => {
            if let Err(e) = pool.insert_sound_effect_entry(&result.name, player) {
                return result.fail(e);
            }
            result.registered_to_pool = true;
            result.succeed()
        }
        Err(e) => result.fail(e),
    }
}

fn finalize_sprite_font(
    mut result: LoadResult,
    request: &crate::request::Request,
    uses_pool: bool,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::SpriteFont(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter("not a sprite font request".into()));
    };
    if !uses_pool {
        return result.fail(unsupported_handle_mode("sprite font"));
    }
    let Some(pool) = pool else {
        return result.fail(no_pool_err());
    };
    match pool.load_sprite_font(
        &result.name,
        &params.path,
        params.companion_texture_path.as_deref(),
        params.enable_mipmaps,
    ) {
        Ok(()) => {
            result.registered_to_pool = true;
            result.succeed()
        }
        Err(e) => result.fail(e),
    }
}

fn finalize_true_type_font(
    mut result: LoadResult,
    request: &crate::request::Request,
    uses_pool: bool,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::TrueTypeFont(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter(
            "not a true type font request".into(),
        ));
    };
    if !uses_pool {
        return result.fail(unsupported_handle_mode("true type font"));
    }
    let Some(pool) = pool else {
        return result.fail(no_pool_err());
    };
    match pool.load_true_type_font(&result.name, &params.path, params.width, params.height) {
        Ok(()) => {
            result.registered_to_pool = true;
            result.succeed()
        }
        Err(e) => result.fail(e),
    }
}

fn finalize_effect(
    mut result: LoadResult,
    request: &crate::request::Request,
    uses_pool: bool,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::Effect(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter("not an effect request".into()));
    };
    if !uses_pool {
        return result.fail(unsupported_handle_mode("effect"));
    }
    let Some(pool) = pool else {
        return result.fail(no_pool_err());
    };
    match pool.load_effect(&result.name, &params.path) {
        Ok(()) => {
            result.registered_to_pool = true;
            result.succeed()
        }
        Err(e) => result.fail(e),
    }
}

fn finalize_model(
    mut result: LoadResult,
    request: &crate::request::Request,
    uses_pool: bool,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::Model(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter("not a model request".into()));
    };
    if !uses_pool {
        return result.fail(unsupported_handle_mode("model"));
    }
    let Some(pool) = pool else {
        return result.fail(no_pool_err());
    };
    match pool.load_model(&result.name, &params.path) {
        Ok(()) => {
            result.registered_to_pool = true;
            result.succeed()
        }
        Err(e) => result.fail(e),
    }
}

fn finalize_particle(
    mut result: LoadResult,
    request: &crate::request::Request,
    uses_pool: bool,
    pool: Option<&PoolRef>,
) -> LoadResult {
    let RequestPayload::Particle(params) = &request.payload else {
        return result.fail(LoaderError::InvalidParameter("not a particle request".into()));
    };
    if !uses_pool {
        return result.fail(unsupported_handle_mode("particle"));
    }
    let Some(pool) = pool else {
        return result.fail(no_pool_err());
    };
    match pool.load_particle(
        &result.name,
        &params.path,
        &params.image_name,
        params.collision_a,
        params.collision_b,
        params.is_rect,
    ) {
        Ok(()) => {
            result.registered_to_pool = true;
            result.succeed()
        }
        Err(e) => result.fail(e),
    }
}
