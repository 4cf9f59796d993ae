//! The task record (§3/§4.2): a submitted batch of requests tracked as a
//! unit for progress, cancellation, and result retrieval.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::collab::pool::PoolRef;
use crate::request::Request;
use crate::result::LoadResult;

/// Opaque task identifier. Monotonically increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lifecycle state, §3's Task status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    Pending = 0,
    Loading = 1,
    Completed = 2,
    Cancelled = 3,
    /// Reserved by the original design; never produced by this crate (see
    /// the preserved open question in SPEC_FULL §9).
    Failed = 4,
}

impl TaskStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskStatus::Pending,
            1 => TaskStatus::Loading,
            2 => TaskStatus::Completed,
            3 => TaskStatus::Cancelled,
            _ => TaskStatus::Failed,
        }
    }
}

/// A submitted batch of requests. Cheap to clone (wrap in `Arc`); workers
/// and the pump share one instance per task.
pub struct Task {
    id: TaskId,
    requests: Vec<Request>,
    results: Mutex<Vec<Option<LoadResult>>>,
    completed_count: AtomicUsize,
    status: AtomicU8,
    cancelled: AtomicBool,
    uses_pool: bool,
    target_pool: Option<PoolRef>,
}

impl Task {
    pub(crate) fn new(requests: Vec<Request>, uses_pool: bool, target_pool: Option<PoolRef>) -> Self {
        let len = requests.len();
        Self {
            id: TaskId::next(),
            requests,
            results: Mutex::new(vec![None; len]),
            completed_count: AtomicUsize::new(0),
            status: AtomicU8::new(TaskStatus::Pending as u8),
            cancelled: AtomicBool::new(false),
            uses_pool,
            target_pool,
        }
    }

    /// Builds a task outside of [`crate::loader::Loader::submit`]. Only
    /// meant for the benchmark/test harness, where we need a `Task` to
    /// drive the pump directly without a full loader instance.
    #[cfg(any(test, feature = "testing"))]
    pub fn new_for_testing(requests: Vec<Request>, uses_pool: bool, target_pool: Option<PoolRef>) -> Self {
        Self::new(requests, uses_pool, target_pool)
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn total(&self) -> usize {
        self.requests.len()
    }

    pub fn completed(&self) -> usize {
        self.completed_count.load(Ordering::Acquire)
    }

    /// Fraction in `[0.0, 1.0]`; `1.0` for a task with no requests.
    pub fn progress(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        self.completed() as f32 / total as f32
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_completed(&self) -> bool {
        self.status() == TaskStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn uses_pool(&self) -> bool {
        self.uses_pool
    }

    pub fn target_pool(&self) -> Option<&PoolRef> {
        self.target_pool.as_ref()
    }

    /// Transitions `Pending -> Loading`. A no-op if the task has already
    /// moved past `Pending` (e.g. a second worker can't observe a task
    /// already being processed, since each task is owned by one worker at
    /// a time, but this keeps the transition idempotent regardless).
    pub(crate) fn start_loading(&self) {
        let _ = self.status.compare_exchange(
            TaskStatus::Pending as u8,
            TaskStatus::Loading as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Raises the cancel flag. Workers observe this between requests
    /// (coarse-grained, per §5) and transition `status` to `Cancelled`
    /// themselves; in-flight decode work runs to completion.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Called by a worker once it observes the cancel flag between
    /// requests.
    pub(crate) fn mark_cancelled_status(&self) {
        self.status
            .store(TaskStatus::Cancelled as u8, Ordering::Release);
    }

    /// Snapshot of all results gathered so far. `None` at an index means
    /// that request hasn't been finalized yet.
    pub fn results(&self) -> Vec<Option<LoadResult>> {
        self.results.lock().expect("lock poisoned").clone()
    }

    pub(crate) fn set_result(&self, index: usize, result: LoadResult) {
        let mut guard = self.results.lock().expect("lock poisoned");
        guard[index] = Some(result);
    }

    /// Called once per finalized request; flips status to `Completed` when
    /// every request has been accounted for.
    pub(crate) fn increment_completed(&self) {
        let done = self.completed_count.fetch_add(1, Ordering::AcqRel) + 1;
        if done >= self.total() && !self.is_cancelled() {
            self.status
                .store(TaskStatus::Completed as u8, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("total", &self.total())
            .field("completed", &self.completed())
            .field("status", &self.status())
            .finish()
    }
}
