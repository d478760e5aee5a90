//! Task table owned by the scheduler.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::QueueError;
use crate::task::{Task, TaskId, TaskStatus};

/// Task store trait for the scheduler's task table.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert or replace a task.
    async fn save(&self, task: &Task) -> Result<(), QueueError>;

    /// Load a task by ID.
    async fn load(&self, id: &TaskId) -> Result<Option<Task>, QueueError>;

    /// All tasks, oldest first.
    async fn list(&self) -> Result<Vec<Task>, QueueError>;

    /// Tasks currently in `status`, oldest first.
    async fn list_by_status(&self, status: TaskStatus) -> Result<Vec<Task>, QueueError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|t| t.status == status)
            .collect())
    }
}

/// In-memory task store.
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl MemoryTaskStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn save(&self, task: &Task) -> Result<(), QueueError> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn load(&self, id: &TaskId) -> Result<Option<Task>, QueueError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>, QueueError> {
        let tasks = self.tasks.read().await;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by_key(|t| t.created_at);
        Ok(all)
    }
}
