//! The worker pool (§4.3, §5): a fixed set of OS threads that pull tasks
//! off a shared queue and run the CPU-side decode stage. Workers never
//! touch the graphics device or audio engine -- that's invariant 4, and is
//! enforced here at the type level: [`DecodeCollaborators`] simply has no
//! `device`/`audio_engine`/`pool` fields to reach for.
//!
//! Grounded in `synthizer`'s `worker_pool::threaded::ThreadedPoolImpl`
//! (`std::thread::spawn` + a blocking queue) rather than the teacher's
//! `tokio`-based `RenderWorkerPool`, since §5 requires non-cooperative OS
//! scheduling and a synchronous public facade.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use log::{debug, info};

use crate::collab::decoders::{is_container_format, AudioDecoderFactory, ImageDecoder};
use crate::collab::file_system::FileSystem;
use crate::request::{AnimationSource, RequestPayload, SpriteTextureRef};
use crate::result::{Intermediate, LoadResult};
use crate::task::Task;

/// The subset of collaborators a worker thread is allowed to see.
#[derive(Clone)]
pub struct DecodeCollaborators {
    pub file_system: Arc<dyn FileSystem>,
    pub image_decoder: Arc<dyn ImageDecoder>,
    pub audio_decoder_factory: Arc<dyn AudioDecoderFactory>,
}

/// One finished decode, queued for the main-thread pump to finalize.
pub struct CompletionEntry {
    pub task: Arc<Task>,
    pub index: usize,
    pub result: LoadResult,
}

struct PoolShared {
    queue: Mutex<VecDeque<Arc<Task>>>,
    queue_cv: Condvar,
    completion: Mutex<VecDeque<CompletionEntry>>,
    shutdown: AtomicBool,
    collaborators: DecodeCollaborators,
}

/// Owns the worker threads. Dropping it (via [`crate::loader::Loader`]'s
/// `Drop`) signals shutdown and joins every thread.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(thread_count: usize, collaborators: DecodeCollaborators) -> Self {
        let thread_count = thread_count.max(1);
        let shared = Arc::new(PoolShared {
            queue: Mutex::new(VecDeque::new()),
            queue_cv: Condvar::new(),
            completion: Mutex::new(VecDeque::new()),
            shutdown: AtomicBool::new(false),
            collaborators,
        });

        info!("starting resource-loader worker pool with {thread_count} threads");

        let handles = (0..thread_count)
            .map(|idx| {
                let shared = shared.clone();
                std::thread::Builder::new()
                    .name(format!("resource-loader-worker-{idx}"))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn resource-loader worker thread")
            })
            .collect();

        Self { shared, handles }
    }

    pub fn submit(&self, task: Arc<Task>) {
        let mut queue = self.shared.queue.lock().expect("lock poisoned");
        queue.push_back(task);
        self.shared.queue_cv.notify_one();
    }

    /// Drains every finished decode currently queued, without blocking.
    pub fn drain_completions(&self) -> Vec<CompletionEntry> {
        let mut queue = self.shared.completion.lock().expect("lock poisoned");
        queue.drain(..).collect()
    }

    /// Removes queued (not yet started) tasks belonging to `pool_name`, per
    /// `ClearTasksForPool`'s queue-rebuild behavior (SPEC_FULL §11).
    pub fn retain_tasks(&self, mut keep: impl FnMut(&Arc<Task>) -> bool) {
        let mut queue = self.shared.queue.lock().expect("lock poisoned");
        queue.retain(|t| keep(t));
    }

    pub fn retain_completions(&self, mut keep: impl FnMut(&CompletionEntry) -> bool) {
        let mut queue = self.shared.completion.lock().expect("lock poisoned");
        queue.retain(|e| keep(e));
    }

    pub fn thread_count(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.queue_cv.notify_all();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        debug!("resource-loader worker pool shut down");
    }
}

fn worker_loop(shared: Arc<PoolShared>) {
    loop {
        let task = {
            let mut queue = shared.queue.lock().expect("lock poisoned");
            loop {
                if let Some(task) = queue.pop_front() {
                    break Some(task);
                }
                if shared.shutdown.load(Ordering::Acquire) {
                    break None;
                }
                queue = shared
                    .queue_cv
                    .wait(queue)
                    .expect("lock poisoned");
            }
        };

        let Some(task) = task else { break };
        process_task(&shared, &task);
    }
}

fn process_task(shared: &PoolShared, task: &Arc<Task>) {
    task.start_loading();

    for (index, request) in task.requests().iter().enumerate() {
        if task.is_cancelled() {
            task.mark_cancelled_status();
            break;
        }

        let result = decode::decode_request(&shared.collaborators, request);

        let mut completion = shared.completion.lock().expect("lock poisoned");
        completion.push_back(CompletionEntry {
            task: task.clone(),
            index,
            result,
        });
    }
}

/// Per-kind CPU-side decode routines, one for one with the original's
/// `LoadXxxWorker` functions.
pub mod decode {
    use super::*;
    use crate::error::LoaderError;
    use crate::request::Request;

    pub fn decode_request(collab: &DecodeCollaborators, request: &Request) -> LoadResult {
        match &request.payload {
            RequestPayload::Texture(p) => texture(collab, request, p),
            // Sprite/Animation/Particle are CPU-only in the decode stage and
            // don't spend the GPU quota (`LoadSpriteWorker`/`LoadAnimationWorker`/
            // `LoadParticleWorker` all call `InitWorkerResult(request, false)`,
            // `AsyncResourceLoader.cpp:693,700,834`).
            RequestPayload::Sprite(_) => pass_through(request, false),
            RequestPayload::Animation(p) => animation(request, p),
            RequestPayload::Music(p) => music(collab, request, p),
            RequestPayload::SoundEffect(p) => sound_effect(collab, request, p),
            RequestPayload::SpriteFont(p) => file_presence(collab, request, &p.path, true),
            RequestPayload::TrueTypeFont(p) => true_type_font(collab, request, p),
            RequestPayload::Effect(p) => file_presence(collab, request, &p.path, true),
            RequestPayload::Model(p) => file_presence(collab, request, &p.path, true),
            RequestPayload::Particle(p) => file_presence(collab, request, &p.path, false),
        }
    }

    fn texture(
        collab: &DecodeCollaborators,
        request: &Request,
        params: &crate::request::TextureParams,
    ) -> LoadResult {
        let pending = LoadResult::pending(request, true);

        if params.path.is_empty() {
            if params.width <= 0 || params.height <= 0 {
                return pending.fail(LoaderError::InvalidParameter(
                    "blank texture requires positive width and height".into(),
                ));
            }
            // Blank texture: nothing to read or decode, finalize creates it
            // directly from width/height.
            return pending.succeed();
        }

        let Some(bytes) = collab.file_system.open_file(&params.path) else {
            return pending.fail(LoaderError::FileNotFound(params.path.clone()));
        };

        if is_container_format(&bytes) {
            let mut result = pending;
            result.intermediate = Intermediate::RawBytes(bytes);
            return result.succeed();
        }

        match collab.image_decoder.decode(&bytes) {
            Ok(image) => {
                let mut result = pending;
                result.intermediate = Intermediate::Image(image);
                result.needs_mipmap_generation = params.enable_mipmaps;
                result.succeed()
            }
            Err(e) => pending.fail(e),
        }
    }

    fn true_type_font(
        collab: &DecodeCollaborators,
        request: &Request,
        params: &crate::request::TrueTypeFontParams,
    ) -> LoadResult {
        let pending = LoadResult::pending(request, true);
        if params.width <= 0.0 || params.height <= 0.0 {
            return pending.fail(LoaderError::InvalidParameter(format!(
                "Invalid font size: width={}, height={}",
                params.width, params.height
            )));
        }
        if !collab.file_system.has_file(&params.path) {
            return pending.fail(LoaderError::FileNotFound(params.path.clone()));
        }
        pending.succeed()
    }

    fn animation(request: &Request, params: &crate::request::AnimationParams) -> LoadResult {
        // Both sources are resolved against already-loaded resources at
        // finalize time; there is nothing to decode here. CPU-only, like
        // Sprite and Particle.
        let _ = params;
        pass_through(request, false)
    }

    fn music(
        collab: &DecodeCollaborators,
        request: &Request,
        params: &crate::request::MusicParams,
    ) -> LoadResult {
        let mut pending = LoadResult::pending(request, false);

        let Some(bytes) = collab.file_system.open_file(&params.path) else {
            return pending.fail(LoaderError::FileNotFound(params.path.clone()));
        };

        match collab.audio_decoder_factory.create(&params.path, &bytes) {
            Ok(decoder) => {
                pending.intermediate = Intermediate::AudioDecoder(decoder);
                pending.succeed()
            }
            Err(e) => pending.fail(e),
        }
    }

    fn sound_effect(
        collab: &DecodeCollaborators,
        request: &Request,
        params: &crate::request::SoundEffectParams,
    ) -> LoadResult {
        let mut pending = LoadResult::pending(request, false);

        let Some(bytes) = collab.file_system.open_file(&params.path) else {
            return pending.fail(LoaderError::FileNotFound(params.path.clone()));
        };

        match collab.audio_decoder_factory.create(&params.path, &bytes) {
            Ok(decoder) => {
                pending.intermediate = Intermediate::AudioDecoder(decoder);
                pending.succeed()
            }
            Err(e) => pending.fail(e),
        }
    }

    /// Composed kinds (Sprite, Animation) need no file I/O up front; they
    /// reference already-loaded resources and are built entirely during
    /// finalize.
    fn pass_through(request: &Request, requires_gpu: bool) -> LoadResult {
        if let RequestPayload::Sprite(p) = &request.payload {
            if let SpriteTextureRef::Named(name) = &p.texture {
                if name.is_empty() {
                    return LoadResult::pending(request, requires_gpu)
                        .fail(LoaderError::InvalidParameter("sprite texture name is empty".into()));
                }
            }
        }
        if let RequestPayload::Animation(p) = &request.payload {
            if let AnimationSource::FromSprites(names) = &p.source {
                if names.is_empty() {
                    return LoadResult::pending(request, requires_gpu).fail(
                        LoaderError::InvalidParameter("animation has no source sprites".into()),
                    );
                }
            }
        }
        LoadResult::pending(request, requires_gpu).succeed()
    }

    /// Kinds whose decode stage is just an existence check, with the real
    /// construction delegated to the resource pool at finalize time
    /// (SpriteFont, TrueTypeFont, Effect, Model, Particle).
    fn file_presence(
        collab: &DecodeCollaborators,
        request: &Request,
        path: &str,
        requires_gpu: bool,
    ) -> LoadResult {
        let pending = LoadResult::pending(request, requires_gpu);
        if path.is_empty() {
            return pending.fail(LoaderError::InvalidParameter("path is empty".into()));
        }
        if !collab.file_system.has_file(path) {
            return pending.fail(LoaderError::FileNotFound(path.to_string()));
        }
        pending.succeed()
    }
}
