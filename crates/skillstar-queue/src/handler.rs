//! The seam between the scheduler and whatever actually performs a task.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::QueueError;
use crate::task::{ResultRecord, Task};

/// Progress snapshot emitted after each skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Skills finished so far.
    pub current: usize,
    pub total: usize,
    pub current_skill_label: String,
}

/// Callback handed to a running task for progress reporting.
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Arc<dyn Fn(ProgressUpdate) + Send + Sync>,
}

impl ProgressReporter {
    pub fn new(sink: impl Fn(ProgressUpdate) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Reporter that drops every update.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, update: ProgressUpdate) {
        (self.sink)(update);
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter").finish_non_exhaustive()
    }
}

/// Everything a running task receives from the scheduler.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Raised by `abort_all`; poll it between steps.
    pub cancel: CancellationToken,
    pub progress: ProgressReporter,
}

impl TaskContext {
    pub fn new(cancel: CancellationToken, progress: ProgressReporter) -> Self {
        Self { cancel, progress }
    }
}

/// What a handler produced for a task that got past setup.
#[derive(Debug, Clone, Default)]
pub struct TaskOutcome {
    pub results: Vec<ResultRecord>,
    /// Processing stopped because the cancellation token was raised.
    pub aborted: bool,
}

impl TaskOutcome {
    pub fn completed(results: Vec<ResultRecord>) -> Self {
        Self {
            results,
            aborted: false,
        }
    }

    pub fn aborted(results: Vec<ResultRecord>) -> Self {
        Self {
            results,
            aborted: true,
        }
    }
}

/// Task handler trait.
///
/// `Err` marks the whole task failed with no results; per-item failures
/// belong in the returned [`TaskOutcome`].
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Execute a task.
    async fn handle(&self, task: &Task, ctx: TaskContext) -> Result<TaskOutcome, QueueError>;
}
