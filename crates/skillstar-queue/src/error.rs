//! Queue errors.

use thiserror::Error;

use crate::task::TaskStatus;

/// Queue error types.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Queue is full.
    #[error("Queue is full")]
    QueueFull,

    /// Request carries no skills or no targets.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Status change that would move a task backwards or out of a terminal state.
    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    /// The scheduler actor has stopped.
    #[error("Scheduler is not running")]
    SchedulerStopped,

    /// Worker error.
    #[error("Worker error: {0}")]
    WorkerError(String),

    /// Task could not be set up (no valid students or skills).
    #[error("Task setup failed: {0}")]
    Setup(String),
}
