use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use crate::planning::domain::{AssignmentId, ClaimRule, Family};
use crate::planning::repository::RepositoryError;

/// One placement written back during a weekly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyPlacement {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub block_number: u8,
    pub block_id: String,
    pub assignment_id: AssignmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AssignmentId>,
    pub title: String,
    pub family: Family,
    pub rule: ClaimRule,
}

/// A write that failed; the run carried on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementFailure {
    pub date: NaiveDate,
    pub block_number: u8,
    pub assignment_id: AssignmentId,
    pub reason: String,
}

/// A weekday whose template could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub reason: String,
}

/// Best-effort outcome of a weekly auto-fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoFillReport {
    pub student: String,
    pub week_start: NaiveDate,
    pub placements: Vec<WeeklyPlacement>,
    pub failures: Vec<PlacementFailure>,
    pub skipped_days: Vec<SkippedDay>,
    /// Candidates (after module splitting) left without a slot this week.
    pub remaining_unplaced: usize,
}

impl AutoFillReport {
    pub(crate) fn new(student: &str, week_start: NaiveDate) -> Self {
        Self {
            student: student.to_string(),
            week_start,
            placements: Vec::new(),
            failures: Vec::new(),
            skipped_days: Vec::new(),
            remaining_unplaced: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.skipped_days.is_empty()
    }

    pub fn placements_on(&self, date: NaiveDate) -> impl Iterator<Item = &WeeklyPlacement> + '_ {
        self.placements
            .iter()
            .filter(move |placement| placement.date == date)
    }

    pub(crate) fn record_failure(
        &mut self,
        date: NaiveDate,
        block_number: u8,
        assignment_id: AssignmentId,
        error: &RepositoryError,
    ) {
        self.failures.push(PlacementFailure {
            date,
            block_number,
            assignment_id,
            reason: error.to_string(),
        });
    }
}
