//! Single-consumer scheduler.
//!
//! The scheduler is an actor: one tokio task owns the queue, the task table,
//! and the cancellation token. Callers talk to it through a cloneable
//! [`SchedulerHandle`]; the running task talks back through worker events.
//! At most one task is processing at any time, which is the only thing that
//! serializes access to the shared browser page.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skillstar_config::QueueConfig;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::error::QueueError;
use crate::handler::{ProgressReporter, ProgressUpdate, TaskContext, TaskHandler, TaskOutcome};
use crate::store::{MemoryTaskStore, TaskStore};
use crate::task::{Task, TaskId, TaskRequest, TaskStatus};

/// Result of [`SchedulerHandle::abort_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortSummary {
    /// Queued tasks aborted plus the running task, if any.
    pub cleared_count: usize,
}

enum Command {
    Submit {
        request: TaskRequest,
        reply: oneshot::Sender<Result<TaskId, QueueError>>,
    },
    Status {
        id: TaskId,
        reply: oneshot::Sender<Option<Task>>,
    },
    List {
        reply: oneshot::Sender<Vec<Task>>,
    },
    Abort {
        reply: oneshot::Sender<AbortSummary>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

enum WorkerEvent {
    Progress {
        id: TaskId,
        update: ProgressUpdate,
    },
    Finished {
        id: TaskId,
        result: Result<TaskOutcome, QueueError>,
    },
}

/// Cloneable client of a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| QueueError::SchedulerStopped)?;
        rx.await.map_err(|_| QueueError::SchedulerStopped)
    }

    /// Queue a task. Returns as soon as it is queued; outcomes are observed
    /// through [`status`](Self::status).
    pub async fn submit(&self, request: TaskRequest) -> Result<TaskId, QueueError> {
        self.request(|reply| Command::Submit { request, reply })
            .await?
    }

    /// Snapshot of a task.
    pub async fn status(&self, id: TaskId) -> Result<Option<Task>, QueueError> {
        self.request(|reply| Command::Status { id, reply }).await
    }

    /// Snapshot of every known task, oldest first.
    pub async fn list(&self) -> Result<Vec<Task>, QueueError> {
        self.request(|reply| Command::List { reply }).await
    }

    /// Raise the cancellation flag, abort everything queued, and signal the
    /// running task. The flag clears after the configured grace window.
    pub async fn abort_all(&self) -> Result<AbortSummary, QueueError> {
        self.request(|reply| Command::Abort { reply }).await
    }

    /// Stop the scheduler; a running task is cancelled.
    pub async fn shutdown(&self) -> Result<(), QueueError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

/// Scheduler actor state.
pub struct Scheduler<H: TaskHandler + 'static> {
    handler: Arc<H>,
    config: QueueConfig,
    store: Arc<dyn TaskStore>,
    pending: VecDeque<TaskId>,
    running: Option<TaskId>,
    cancel: CancellationToken,
    /// End of the post-abort grace window; nothing is dequeued before it.
    abort_until: Option<Instant>,
    events_tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl<H: TaskHandler + 'static> Scheduler<H> {
    /// Spawn a scheduler with an in-memory task table.
    pub fn spawn(handler: Arc<H>, config: QueueConfig) -> SchedulerHandle {
        Self::spawn_with_store(handler, config, Arc::new(MemoryTaskStore::new()))
    }

    /// Spawn a scheduler with a custom task table.
    pub fn spawn_with_store(
        handler: Arc<H>,
        config: QueueConfig,
        store: Arc<dyn TaskStore>,
    ) -> SchedulerHandle {
        let (tx, commands) = mpsc::channel(64);
        let (events_tx, events) = mpsc::unbounded_channel();

        let scheduler = Self {
            handler,
            config,
            store,
            pending: VecDeque::new(),
            running: None,
            cancel: CancellationToken::new(),
            abort_until: None,
            events_tx,
        };

        tokio::spawn(scheduler.run(commands, events));
        SchedulerHandle { tx }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<WorkerEvent>,
    ) {
        info!("Scheduler started");

        loop {
            let grace_deadline = self.abort_until;

            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd).await {
                            break;
                        }
                    }
                    None => {
                        self.cancel.cancel();
                        break;
                    }
                },
                Some(event) = events.recv() => self.handle_event(event).await,
                _ = wait_until(grace_deadline) => self.clear_abort(),
            }

            self.start_next().await;
        }

        info!("Scheduler stopped");
    }

    /// Returns `false` once the scheduler should stop.
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Submit { request, reply } => {
                let _ = reply.send(self.enqueue(request).await);
            }
            Command::Status { id, reply } => {
                let task = match self.store.load(&id).await {
                    Ok(task) => task,
                    Err(e) => {
                        error!(task_id = %id, "Failed to load task: {}", e);
                        None
                    }
                };
                let _ = reply.send(task);
            }
            Command::List { reply } => {
                let tasks = self.store.list().await.unwrap_or_else(|e| {
                    error!("Failed to list tasks: {}", e);
                    Vec::new()
                });
                let _ = reply.send(tasks);
            }
            Command::Abort { reply } => {
                let _ = reply.send(self.abort_all().await);
            }
            Command::Shutdown { reply } => {
                self.cancel.cancel();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    async fn enqueue(&mut self, request: TaskRequest) -> Result<TaskId, QueueError> {
        request.validate()?;

        if self.config.max_queue_size > 0 && self.pending.len() >= self.config.max_queue_size {
            return Err(QueueError::QueueFull);
        }

        let task = Task::new(request);
        self.store.save(&task).await?;
        self.pending.push_back(task.id);

        info!(
            task_id = %task.id,
            skills = task.total,
            queued = self.pending.len(),
            "Task queued"
        );
        Ok(task.id)
    }

    async fn abort_all(&mut self) -> AbortSummary {
        self.cancel.cancel();

        let mut cleared = 0;
        while let Some(id) = self.pending.pop_front() {
            if self.modify(id, |t| t.transition(TaskStatus::Aborted)).await.is_some() {
                cleared += 1;
            }
        }
        if self.running.is_some() {
            cleared += 1;
        }

        self.abort_until = Some(Instant::now() + Duration::from_millis(self.config.abort_grace_ms));
        warn!(cleared_count = cleared, "Abort requested");

        AbortSummary {
            cleared_count: cleared,
        }
    }

    fn clear_abort(&mut self) {
        self.abort_until = None;
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        debug!("Abort grace window elapsed, cancellation flag cleared");
    }

    async fn handle_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress { id, update } => {
                self.modify(id, |t| {
                    if !t.status.is_terminal() {
                        t.record_progress(update.current, Some(update.current_skill_label));
                    }
                    Ok(())
                })
                .await;
            }
            WorkerEvent::Finished { id, result } => {
                if self.running == Some(id) {
                    self.running = None;
                }

                match result {
                    Ok(outcome) => {
                        let status = if outcome.aborted {
                            TaskStatus::Aborted
                        } else {
                            TaskStatus::Completed
                        };
                        let count = outcome.results.len();
                        let finished = self
                            .modify(id, |t| {
                                t.results = outcome.results;
                                t.transition(status)
                            })
                            .await;
                        if let Some(task) = finished {
                            info!(
                                task_id = %id,
                                status = ?status,
                                results = count,
                                succeeded = task.succeeded_count(),
                                "Task finished"
                            );
                        }
                    }
                    Err(e) => {
                        error!(task_id = %id, "Task failed: {}", e);
                        self.modify(id, |t| {
                            t.results.clear();
                            t.error = Some(e.to_string());
                            t.transition(TaskStatus::Failed)
                        })
                        .await;
                    }
                }
            }
        }
    }

    /// Dequeue and start the next task if the consumer is idle.
    async fn start_next(&mut self) {
        if self.running.is_some() || self.abort_until.is_some() {
            return;
        }

        while let Some(id) = self.pending.pop_front() {
            if self.cancel.is_cancelled() {
                self.modify(id, |t| t.transition(TaskStatus::Aborted)).await;
                continue;
            }

            let Some(task) = self
                .modify(id, |t| t.transition(TaskStatus::Processing))
                .await
            else {
                continue;
            };

            self.spawn_worker(task);
            self.running = Some(id);
            break;
        }
    }

    fn spawn_worker(&self, task: Task) {
        let id = task.id;
        let handler = self.handler.clone();
        let events = self.events_tx.clone();
        let progress_events = self.events_tx.clone();

        let progress = ProgressReporter::new(move |update| {
            let _ = progress_events.send(WorkerEvent::Progress { id, update });
        });
        let ctx = TaskContext::new(self.cancel.clone(), progress);
        let span = info_span!("task", task_id = %id);

        info!(task_id = %id, "Task processing");

        tokio::spawn(async move {
            let work = tokio::spawn(
                async move { handler.handle(&task, ctx).await }.instrument(span),
            );
            let result = match work.await {
                Ok(result) => result,
                Err(e) => Err(QueueError::WorkerError(format!("task panicked: {}", e))),
            };
            let _ = events.send(WorkerEvent::Finished { id, result });
        });
    }

    /// Load, mutate, and save a task. `None` if it is missing or `f` refused.
    async fn modify<F>(&self, id: TaskId, f: F) -> Option<Task>
    where
        F: FnOnce(&mut Task) -> Result<(), QueueError>,
    {
        let mut task = match self.store.load(&id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                warn!(task_id = %id, "Unknown task");
                return None;
            }
            Err(e) => {
                error!(task_id = %id, "Failed to load task: {}", e);
                return None;
            }
        };

        if let Err(e) = f(&mut task) {
            warn!(task_id = %id, "{}", e);
            return None;
        }

        if let Err(e) = self.store.save(&task).await {
            error!(task_id = %id, "Failed to save task: {}", e);
        }
        Some(task)
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
