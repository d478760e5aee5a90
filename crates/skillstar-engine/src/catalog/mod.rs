//! Student, skill and group catalog.

mod file;
mod memory;

pub use file::FileCatalog;
pub use memory::MemoryCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::model::{Group, HistoryEntry, SkillDescriptor, Student};

/// Catalog operations the engine consumes.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Students with the given ids, in `ids` order; unknown ids are skipped.
    async fn students_by_ids(&self, ids: &[String]) -> Result<Vec<Student>, CatalogError>;

    /// Skills with the given ids, in `ids` order; unknown ids are skipped.
    async fn skills_by_ids(&self, ids: &[String]) -> Result<Vec<SkillDescriptor>, CatalogError>;

    async fn groups(&self) -> Result<Vec<Group>, CatalogError>;

    async fn record_history(&self, entry: &HistoryEntry) -> Result<(), CatalogError>;

    /// Remember the last grade and subject used for a student.
    async fn update_student_defaults(
        &self,
        student_id: &str,
        grade: &str,
        subject: &str,
    ) -> Result<(), CatalogError>;
}

/// Catalog contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub skills: Vec<SkillDescriptor>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl CatalogData {
    pub fn students_by_ids(&self, ids: &[String]) -> Vec<Student> {
        ids.iter()
            .filter_map(|id| self.students.iter().find(|s| &s.id == id))
            .cloned()
            .collect()
    }

    pub fn skills_by_ids(&self, ids: &[String]) -> Vec<SkillDescriptor> {
        ids.iter()
            .filter_map(|id| self.skills.iter().find(|s| &s.id == id))
            .cloned()
            .collect()
    }

    pub fn set_student_defaults(
        &mut self,
        student_id: &str,
        grade: &str,
        subject: &str,
    ) -> Result<(), CatalogError> {
        let student = self
            .students
            .iter_mut()
            .find(|s| s.id == student_id)
            .ok_or_else(|| CatalogError::UnknownStudent(student_id.to_string()))?;
        student.default_grade = Some(grade.to_string());
        student.default_subject = Some(subject.to_string());
        Ok(())
    }
}
