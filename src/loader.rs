//! The loader facade (§4.5): the crate's single public entry point.
//! Construction takes every collaborator as a trait object; `submit` hands
//! work to the worker pool, `update` pumps finished decodes on the calling
//! thread.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info};

use crate::collab::Collaborators;
use crate::config::LoaderConfig;
use crate::pump;
use crate::request::Request;
use crate::task::{Task, TaskId};
use crate::worker::{CompletionEntry, DecodeCollaborators, WorkerPool};

/// The asynchronous resource loader. One instance typically lives for the
/// lifetime of the host application.
pub struct Loader {
    workers: WorkerPool,
    collaborators: Collaborators,
    active_tasks: Mutex<HashMap<TaskId, Arc<Task>>>,
    completion_queue: Mutex<VecDeque<CompletionEntry>>,
    max_gpu_items_per_frame: Mutex<usize>,
}

impl Loader {
    pub fn new(config: LoaderConfig, collaborators: Collaborators) -> Self {
        let thread_count = config.resolved_thread_count();
        info!(
            "creating resource loader: {} threads, {} gpu items/frame",
            thread_count, config.max_gpu_items_per_frame
        );

        let decode_collaborators = DecodeCollaborators {
            file_system: collaborators.file_system.clone(),
            image_decoder: collaborators.image_decoder.clone(),
            audio_decoder_factory: collaborators.audio_decoder_factory.clone(),
        };

        Self {
            workers: WorkerPool::new(thread_count, decode_collaborators),
            collaborators,
            active_tasks: Mutex::new(HashMap::new()),
            completion_queue: Mutex::new(VecDeque::new()),
            max_gpu_items_per_frame: Mutex::new(config.max_gpu_items_per_frame),
        }
    }

    /// Submits a batch of requests as one task. Returns `None` if `requests`
    /// is empty or the loader is already shutting down, matching the
    /// original's "empty requests / shutdown -> null task" behavior
    /// (§7, SPEC_FULL §9).
    ///
    /// In pool mode (`uses_pool == true`) without an explicit `target_pool`,
    /// the currently active pool is captured from the active-pool provider
    /// at submit time (§4.5).
    pub fn submit(
        &self,
        requests: Vec<Request>,
        uses_pool: bool,
        target_pool: Option<crate::collab::pool::PoolRef>,
    ) -> Option<TaskId> {
        if requests.is_empty() {
            return None;
        }
        let resolved_pool = if uses_pool {
            target_pool.or_else(|| self.collaborators.active_pool.current())
        } else {
            None
        };
        let task = Arc::new(Task::new(requests, uses_pool, resolved_pool));
        let id = task.id();
        self.active_tasks
            .lock()
            .expect("lock poisoned")
            .insert(id, task.clone());
        self.workers.submit(task);
        Some(id)
    }

    pub fn task(&self, id: TaskId) -> Option<Arc<Task>> {
        self.active_tasks.lock().expect("lock poisoned").get(&id).cloned()
    }

    /// Pumps finished decodes through finalize. Never blocks: drains
    /// whatever the worker pool has already queued and finalizes up to the
    /// configured GPU-item quota.
    pub fn update(&self) {
        {
            let mut queue = self.completion_queue.lock().expect("lock poisoned");
            queue.extend(self.workers.drain_completions());
        }

        let quota = *self.max_gpu_items_per_frame.lock().expect("lock poisoned");
        let mut queue = self.completion_queue.lock().expect("lock poisoned");
        pump::run_once(&mut queue, &self.collaborators, quota);

        self.active_tasks
            .lock()
            .expect("lock poisoned")
            .retain(|_, task| !task.is_completed() && !task.is_cancelled());
    }

    /// Marks `id` cancelled. Workers observe this between requests (coarse
    /// grained, §5); already-finalized results are kept.
    pub fn cancel(&self, id: TaskId) {
        if let Some(task) = self.task(id) {
            task.cancel();
        }
    }

    /// Blocks the calling thread, polling at a 10ms grain, until `id` is
    /// completed or cancelled.
    pub fn wait_all(&self, id: TaskId) {
        while let Some(task) = self.task(id) {
            if task.is_completed() || task.is_cancelled() {
                break;
            }
            self.update();
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Cancels every active task and empties both the pending-task queue
    /// and the completion queue.
    pub fn clear_all(&self) {
        debug!("clearing all resource-loader tasks");
        let tasks: Vec<Arc<Task>> = self
            .active_tasks
            .lock()
            .expect("lock poisoned")
            .values()
            .cloned()
            .collect();
        for task in &tasks {
            task.cancel();
        }
        // Let any worker mid-request notice the flag before we drop its
        // queue entry out from under it.
        std::thread::sleep(Duration::from_millis(1));
        for task in &tasks {
            task.mark_cancelled_status();
        }
        self.workers.retain_tasks(|_| false);
        self.workers.retain_completions(|_| false);
        self.completion_queue.lock().expect("lock poisoned").clear();
        self.active_tasks.lock().expect("lock poisoned").clear();
    }

    /// Cancels and drops every pool-mode task, rebuilding both queues
    /// (SPEC_FULL §11's fuller `ClearTasksForPool` behavior). Predicated
    /// purely on `uses_pool`, not on `pool_name` matching a specific pool
    /// -- a known limitation carried over from `spec.md` §9's design notes
    /// ("uses `uses_pool` rather than pool identity"); a future revision
    /// would carry an explicit pool identifier on the task instead.
    pub fn clear_for_pool(&self, pool_name: &str) {
        debug!("clearing resource-loader tasks for pool {pool_name}");
        let targets_pool = |task: &Arc<Task>| task.uses_pool();

        let tasks: Vec<Arc<Task>> = self
            .active_tasks
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|t| targets_pool(t))
            .cloned()
            .collect();
        for task in &tasks {
            task.cancel();
        }
        std::thread::sleep(Duration::from_millis(1));
        for task in &tasks {
            task.mark_cancelled_status();
        }

        self.workers.retain_tasks(|t| !targets_pool(t));
        self.workers
            .retain_completions(|e| !targets_pool(&e.task));
        self.completion_queue
            .lock()
            .expect("lock poisoned")
            .retain(|e| !targets_pool(&e.task));
        self.active_tasks
            .lock()
            .expect("lock poisoned")
            .retain(|_, t| !targets_pool(t));
    }

    pub fn set_max_gpu_items_per_frame(&self, n: usize) {
        *self.max_gpu_items_per_frame.lock().expect("lock poisoned") = n;
    }

    pub fn thread_count(&self) -> usize {
        self.workers.thread_count()
    }
}
