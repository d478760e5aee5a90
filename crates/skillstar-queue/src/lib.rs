//! # Skillstar Queue
//!
//! Sequential task queue for assignment batches.
//!
//! ## Features
//!
//! - FIFO queue drained by exactly one consumer
//! - Monotonic task status machine (`queued → processing → completed | failed | aborted`)
//! - Pollable progress and results
//! - Cooperative cancellation through a [`CancellationToken`] handed to every task,
//!   re-armed after a grace window
//! - Message-passing surface ([`SchedulerHandle`]) instead of shared globals

pub mod error;
pub mod handler;
pub mod scheduler;
pub mod store;
pub mod task;

pub use error::QueueError;
pub use handler::{ProgressReporter, ProgressUpdate, TaskContext, TaskHandler, TaskOutcome};
pub use scheduler::{AbortSummary, Scheduler, SchedulerHandle};
pub use store::{MemoryTaskStore, TaskStore};
pub use task::{
    ResultRecord, SuggestAction, Task, TaskId, TaskRequest, TaskStatus, TaskTargets,
};

pub use tokio_util::sync::CancellationToken;
