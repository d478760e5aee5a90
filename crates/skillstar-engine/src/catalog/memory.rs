//! In-memory catalog.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Catalog, CatalogData};
use crate::error::CatalogError;
use crate::model::{Group, HistoryEntry, SkillDescriptor, Student};

/// Catalog held in memory; history rows are kept in a vector.
#[derive(Default)]
pub struct MemoryCatalog {
    data: RwLock<CatalogData>,
    history: RwLock<Vec<HistoryEntry>>,
}

impl MemoryCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self {
            data: RwLock::new(data),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Recorded history rows, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().clone()
    }

    pub fn student(&self, id: &str) -> Option<Student> {
        self.data.read().students.iter().find(|s| s.id == id).cloned()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn students_by_ids(&self, ids: &[String]) -> Result<Vec<Student>, CatalogError> {
        Ok(self.data.read().students_by_ids(ids))
    }

    async fn skills_by_ids(&self, ids: &[String]) -> Result<Vec<SkillDescriptor>, CatalogError> {
        Ok(self.data.read().skills_by_ids(ids))
    }

    async fn groups(&self) -> Result<Vec<Group>, CatalogError> {
        Ok(self.data.read().groups.clone())
    }

    async fn record_history(&self, entry: &HistoryEntry) -> Result<(), CatalogError> {
        self.history.write().push(entry.clone());
        Ok(())
    }

    async fn update_student_defaults(
        &self,
        student_id: &str,
        grade: &str,
        subject: &str,
    ) -> Result<(), CatalogError> {
        self.data
            .write()
            .set_student_defaults(student_id, grade, subject)
    }
}
