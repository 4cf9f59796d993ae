//! Thin adapter matching §6's external-interface contract shape. There is
//! no hosted scripting runtime behind this in the core crate -- an
//! embedding application binds these methods to its own script bindings.

use std::sync::Arc;

use crate::loader::Loader;
use crate::result::LoadResult;
use crate::task::{Task, TaskId, TaskStatus};

/// A script-facing view over one submitted task.
pub struct TaskHandle {
    task: Arc<Task>,
}

impl TaskHandle {
    pub fn new(task: Arc<Task>) -> Self {
        Self { task }
    }

    pub fn from_loader(loader: &Loader, id: TaskId) -> Option<Self> {
        loader.task(id).map(Self::new)
    }

    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    pub fn progress(&self) -> f32 {
        self.task.progress()
    }

    pub fn is_completed(&self) -> bool {
        self.task.is_completed()
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }

    pub fn status(&self) -> TaskStatus {
        self.task.status()
    }

    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// Blocks the calling thread until the task finishes, pumping `loader`
    /// in between polls.
    pub fn wait(&self, loader: &Loader) {
        loader.wait_all(self.task.id());
    }

    pub fn results(&self) -> Vec<Option<LoadResult>> {
        self.task.results()
    }
}
