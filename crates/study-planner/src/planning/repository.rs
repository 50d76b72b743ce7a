use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::domain::{Assignment, AssignmentId, Family, ScheduleBlock};

/// Write-back payload for one placement made by the weekly auto-fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementUpdate {
    pub assignment_id: AssignmentId,
    /// Present when `assignment_id` names one day of a split module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AssignmentId>,
    pub title: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_block: u8,
    pub detected_family: Family,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
}

/// Storage abstraction for assignment records so planning can be exercised in isolation.
pub trait AssignmentStore: Send + Sync {
    /// Every record owned by the student, placed or not.
    fn assignments_for_student(&self, student: &str) -> Result<Vec<Assignment>, RepositoryError>;
    /// Update-by-id of the scheduled date/block (and cached family).
    fn apply_placement(&self, update: &PlacementUpdate) -> Result<(), RepositoryError>;
}

/// Read-only access to the students' fixed weekly templates.
pub trait ScheduleStore: Send + Sync {
    fn blocks_for(&self, student: &str, weekday: Weekday)
        -> Result<Vec<ScheduleBlock>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl<T: AssignmentStore + ?Sized> AssignmentStore for std::sync::Arc<T> {
    fn assignments_for_student(&self, student: &str) -> Result<Vec<Assignment>, RepositoryError> {
        (**self).assignments_for_student(student)
    }

    fn apply_placement(&self, update: &PlacementUpdate) -> Result<(), RepositoryError> {
        (**self).apply_placement(update)
    }
}

impl<T: ScheduleStore + ?Sized> ScheduleStore for std::sync::Arc<T> {
    fn blocks_for(
        &self,
        student: &str,
        weekday: Weekday,
    ) -> Result<Vec<ScheduleBlock>, RepositoryError> {
        (**self).blocks_for(student, weekday)
    }
}
