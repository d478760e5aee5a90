//! JSON file catalog.
//!
//! Students, skills and groups live in one JSON document; history rows are
//! appended to a JSON-lines file next to it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::{Catalog, CatalogData};
use crate::error::CatalogError;
use crate::model::{Group, HistoryEntry, SkillDescriptor, Student};

/// File-backed catalog.
pub struct FileCatalog {
    path: PathBuf,
    history_path: PathBuf,
    data: RwLock<CatalogData>,
    history_lock: Mutex<()>,
}

impl FileCatalog {
    /// Load the catalog document at `path`.
    ///
    /// History goes to `<stem>.history.jsonl` beside it unless overridden.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let json = tokio::fs::read_to_string(&path).await?;
        let data: CatalogData = serde_json::from_str(&json)?;

        info!(
            "Loaded catalog from {:?}: {} students, {} skills, {} groups",
            path,
            data.students.len(),
            data.skills.len(),
            data.groups.len()
        );

        Ok(Self {
            history_path: path.with_extension("history.jsonl"),
            path,
            data: RwLock::new(data),
            history_lock: Mutex::new(()),
        })
    }

    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Every history row written so far, oldest first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, CatalogError> {
        if !self.history_path.exists() {
            return Ok(Vec::new());
        }

        let text = tokio::fs::read_to_string(&self.history_path).await?;
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(CatalogError::from))
            .collect()
    }

    /// Rewrite the catalog document through a temp file.
    async fn persist(&self, data: &CatalogData) -> Result<(), CatalogError> {
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Saved catalog to {:?}", self.path);
        Ok(())
    }
}

#[async_trait]
impl Catalog for FileCatalog {
    async fn students_by_ids(&self, ids: &[String]) -> Result<Vec<Student>, CatalogError> {
        Ok(self.data.read().await.students_by_ids(ids))
    }

    async fn skills_by_ids(&self, ids: &[String]) -> Result<Vec<SkillDescriptor>, CatalogError> {
        Ok(self.data.read().await.skills_by_ids(ids))
    }

    async fn groups(&self) -> Result<Vec<Group>, CatalogError> {
        Ok(self.data.read().await.groups.clone())
    }

    async fn record_history(&self, entry: &HistoryEntry) -> Result<(), CatalogError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.history_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn update_student_defaults(
        &self,
        student_id: &str,
        grade: &str,
        subject: &str,
    ) -> Result<(), CatalogError> {
        let mut data = self.data.write().await;
        data.set_student_defaults(student_id, grade, subject)?;
        self.persist(&data).await
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
