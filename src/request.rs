//! The request model (§4.1). Construction only -- payload validation is
//! deferred to the worker so that a batch mixing valid and invalid items
//! never aborts the whole submit call.

use std::sync::Arc;

use crate::collab::device::TextureHandle;
use crate::collab::pool::PoolRef;

/// The closed set of resource kinds the loader knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
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

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Texture => "Texture",
            ResourceKind::Sprite => "Sprite",
            ResourceKind::Animation => "Animation",
            ResourceKind::Music => "Music",
            ResourceKind::SoundEffect => "SoundEffect",
            ResourceKind::SpriteFont => "SpriteFont",
            ResourceKind::TrueTypeFont => "TrueTypeFont",
            ResourceKind::Effect => "Effect",
            ResourceKind::Model => "Model",
            ResourceKind::Particle => "Particle",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextureParams {
    pub path: String,
    pub enable_mipmaps: bool,
    /// Used only for blank-texture creation when `path` is empty.
    pub width: i32,
    pub height: i32,
}

/// A sprite may reference a pooled texture by name, or (handle mode) an
/// already-created texture object.
#[derive(Debug, Clone)]
pub enum SpriteTextureRef {
    Named(String),
    Object(TextureHandle),
}

#[derive(Debug, Clone)]
pub struct SpriteParams {
    pub texture: SpriteTextureRef,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// `None` means "use the pool/texture default" -- see SPEC_FULL §4.1.
    pub anchor_x: Option<f64>,
    pub anchor_y: Option<f64>,
    pub collision_a: f64,
    pub collision_b: f64,
    pub is_rect: bool,
}

#[derive(Debug, Clone)]
pub enum AnimationSource {
    FromTexture {
        texture_name: String,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        n: u32,
        m: u32,
        interval: u32,
    },
    FromSprites(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct AnimationParams {
    pub source: AnimationSource,
    pub anchor_x: Option<f64>,
    pub anchor_y: Option<f64>,
    pub collision_a: f64,
    pub collision_b: f64,
    pub is_rect: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MusicParams {
    pub path: String,
    pub loop_start: f64,
    pub loop_end: f64,
    pub stream: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SoundEffectParams {
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct SpriteFontParams {
    pub path: String,
    pub companion_texture_path: Option<String>,
    pub enable_mipmaps: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TrueTypeFontParams {
    pub path: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default)]
pub struct EffectParams {
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct ModelParams {
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParticleParams {
    pub path: String,
    pub image_name: String,
    pub collision_a: f64,
    pub collision_b: f64,
    pub is_rect: bool,
}

/// The per-kind payload, modeled as a sum type rather than a loosely typed
/// property bag (§9 "Replacement of dynamic payload unions").
#[derive(Debug, Clone)]
pub enum RequestPayload {
    Texture(TextureParams),
    Sprite(SpriteParams),
    Animation(AnimationParams),
    Music(MusicParams),
    SoundEffect(SoundEffectParams),
    SpriteFont(SpriteFontParams),
    TrueTypeFont(TrueTypeFontParams),
    Effect(EffectParams),
    Model(ModelParams),
    Particle(ParticleParams),
}

impl RequestPayload {
    pub fn kind(&self) -> ResourceKind {
        match self {
            RequestPayload::Texture(_) => ResourceKind::Texture,
            RequestPayload::Sprite(_) => ResourceKind::Sprite,
            RequestPayload::Animation(_) => ResourceKind::Animation,
            RequestPayload::Music(_) => ResourceKind::Music,
            RequestPayload::SoundEffect(_) => ResourceKind::SoundEffect,
            RequestPayload::SpriteFont(_) => ResourceKind::SpriteFont,
            RequestPayload::TrueTypeFont(_) => ResourceKind::TrueTypeFont,
            RequestPayload::Effect(_) => ResourceKind::Effect,
            RequestPayload::Model(_) => ResourceKind::Model,
            RequestPayload::Particle(_) => ResourceKind::Particle,
        }
    }
}

/// One logical resource to load.
#[derive(Debug, Clone)]
pub struct Request {
    pub name: String,
    pub payload: RequestPayload,
    /// Per-request pool override (`spec.md` §3's "`target_pool` override
    /// (optional)"). When set, finalize targets this pool instead of the
    /// task's default (`GetTargetResourcePool`, `AsyncResourceLoader.cpp:557-567`).
    pub target_pool: Option<PoolRef>,
}

impl Request {
    pub fn new(name: impl Into<String>, payload: RequestPayload) -> Self {
        Self {
            name: name.into(),
            payload,
            target_pool: None,
        }
    }

    /// Overrides the pool this request finalizes into, regardless of the
    /// task's default target pool.
    pub fn with_target_pool(mut self, pool: PoolRef) -> Self {
        self.target_pool = Some(pool);
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.payload.kind()
    }

    pub fn texture(name: impl Into<String>, params: TextureParams) -> Self {
        Self::new(name, RequestPayload::Texture(params))
    }

    pub fn sprite(name: impl Into<String>, params: SpriteParams) -> Self {
        Self::new(name, RequestPayload::Sprite(params))
    }

    pub fn animation(name: impl Into<String>, params: AnimationParams) -> Self {
        Self::new(name, RequestPayload::Animation(params))
    }

    pub fn music(name: impl Into<String>, params: MusicParams) -> Self {
        Self::new(name, RequestPayload::Music(params))
    }

    pub fn sound_effect(name: impl Into<String>, params: SoundEffectParams) -> Self {
        Self::new(name, RequestPayload::SoundEffect(params))
    }

    pub fn sprite_font(name: impl Into<String>, params: SpriteFontParams) -> Self {
        Self::new(name, RequestPayload::SpriteFont(params))
    }

    pub fn true_type_font(name: impl Into<String>, params: TrueTypeFontParams) -> Self {
        Self::new(name, RequestPayload::TrueTypeFont(params))
    }

    pub fn effect(name: impl Into<String>, params: EffectParams) -> Self {
        Self::new(name, RequestPayload::Effect(params))
    }

    pub fn model(name: impl Into<String>, params: ModelParams) -> Self {
        Self::new(name, RequestPayload::Model(params))
    }

    pub fn particle(name: impl Into<String>, params: ParticleParams) -> Self {
        Self::new(name, RequestPayload::Particle(params))
    }
}

/// Shared pointer alias used when requests need to be cloned cheaply across
/// the worker/pump boundary without re-allocating string fields.
pub type RequestList = Arc<Vec<Request>>;
