//! Weekly bulk placement that writes scheduled date/block back to the store.
//!
//! Unlike the display-time engine, the claimed set spans Monday through Friday,
//! study hall only takes work that is short by estimate and needs no special
//! resources, and history modules are split into five daily pieces first.
//! A module's pieces go out in day order, each on a later date than the last.
//! Writes are sequential and independent: one failed write is logged and the
//! run moves on. Callers must not run two auto-fills for the same student at
//! once.

mod modules;
mod report;

pub use report::{AutoFillReport, PlacementFailure, SkippedDay, WeeklyPlacement};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::catalog::PlannerCatalog;
use super::domain::{Assignment, ClaimRule, ScheduleBlock};
use super::placement::pool::{Candidate, CandidatePool};
use super::placement::{resolve_slot, Slot};
use super::repository::{AssignmentStore, PlacementUpdate, RepositoryError, ScheduleStore};

use modules::{expand_modules, ModuleProgress};

const SCHOOL_DAYS: i64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum AutoFillError {
    #[error("could not load assignments for {student}: {source}")]
    LoadAssignments {
        student: String,
        #[source]
        source: RepositoryError,
    },
    #[error("assignment store unreachable before any placement was written: {0}")]
    StoreUnreachable(#[source] RepositoryError),
}

#[derive(Debug, Clone)]
pub struct AutoFillScheduler {
    catalog: Arc<PlannerCatalog>,
}

impl AutoFillScheduler {
    pub fn new(catalog: Arc<PlannerCatalog>) -> Self {
        Self { catalog }
    }

    /// Fills the school week containing `week_start` for `student`.
    pub fn run<A, S>(
        &self,
        assignments: &A,
        schedule: &S,
        student: &str,
        week_start: NaiveDate,
    ) -> Result<AutoFillReport, AutoFillError>
    where
        A: AssignmentStore + ?Sized,
        S: ScheduleStore + ?Sized,
    {
        let monday = week_monday(week_start);
        let records = assignments
            .assignments_for_student(student)
            .map_err(|source| AutoFillError::LoadAssignments {
                student: student.to_string(),
                source,
            })?;

        let mut occupied: HashSet<(NaiveDate, u8)> = records
            .iter()
            .filter_map(|record| Some((record.scheduled_date?, record.scheduled_block?)))
            .collect();
        let pending = expand_modules(
            records
                .into_iter()
                .filter(Assignment::is_unplaced)
                .collect(),
        );

        let classifier = self.catalog.classifier();
        let mut pool = CandidatePool::new(
            pending
                .iter()
                .map(|assignment| Candidate {
                    assignment,
                    family: classifier.family_of(assignment),
                })
                .collect(),
        );

        let mut progress = ModuleProgress::new(&pending);

        let mut report = AutoFillReport::new(student, monday);
        info!(student, %monday, candidates = pool.len(), "starting weekly auto-fill");

        for offset in 0..SCHOOL_DAYS {
            let date = monday + Duration::days(offset);
            let weekday = date.weekday();

            let mut blocks = match schedule.blocks_for(student, weekday) {
                Ok(blocks) => blocks,
                Err(err) => {
                    warn!(student, %date, error = %err, "skipping day: schedule unavailable");
                    report.skipped_days.push(SkippedDay {
                        date,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            blocks.sort_by_key(|block| block.sort_key());

            for block in blocks.iter().filter(|block| block.weekday.applies_to(weekday)) {
                let Some(number) = block.block_number else {
                    continue;
                };
                if occupied.contains(&(date, number)) {
                    continue;
                }
                pool.hold(progress.waiting(date));
                let Some((slot, candidate, rule)) =
                    self.select(block, number, student, weekday, &mut pool)
                else {
                    continue;
                };

                let assignment = candidate.assignment;
                let update = PlacementUpdate {
                    assignment_id: assignment.id.clone(),
                    parent_id: assignment.parent_id.clone(),
                    title: assignment.title.clone(),
                    scheduled_date: date,
                    scheduled_block: number,
                    detected_family: candidate.family,
                    estimated_minutes: assignment.actual_estimated_minutes,
                };

                match assignments.apply_placement(&update) {
                    Ok(()) => {
                        occupied.insert((date, number));
                        progress.record(&assignment.id, date);
                        report.placements.push(WeeklyPlacement {
                            date,
                            weekday,
                            block_number: number,
                            block_id: block.id.clone(),
                            assignment_id: update.assignment_id,
                            parent_id: update.parent_id,
                            title: update.title,
                            family: slot.family,
                            rule,
                        });
                    }
                    Err(err @ RepositoryError::Unavailable(_))
                        if report.placements.is_empty() && report.failures.is_empty() =>
                    {
                        error!(student, error = %err, "assignment store unreachable, aborting auto-fill");
                        return Err(AutoFillError::StoreUnreachable(err));
                    }
                    Err(err) => {
                        warn!(
                            student,
                            %date,
                            block = number,
                            assignment = %update.assignment_id,
                            error = %err,
                            "failed to persist placement"
                        );
                        report.record_failure(date, number, update.assignment_id, &err);
                    }
                }
            }
        }

        report.remaining_unplaced = pool.len().saturating_sub(report.placements.len());
        info!(
            student,
            placed = report.placements.len(),
            failed = report.failures.len(),
            skipped_days = report.skipped_days.len(),
            remaining = report.remaining_unplaced,
            "weekly auto-fill finished"
        );
        Ok(report)
    }

    fn select<'a>(
        &self,
        block: &ScheduleBlock,
        number: u8,
        student: &str,
        weekday: Weekday,
        pool: &mut CandidatePool<'a>,
    ) -> Option<(Slot, Candidate<'a>, ClaimRule)> {
        let catalog = &*self.catalog;
        let slot = resolve_slot(catalog, block, student, weekday)?;

        if let Some(rule) = catalog.rotation.priority_override(student, weekday, number) {
            if let Some(candidate) = pool.claim_override(rule) {
                return Some((slot, candidate, ClaimRule::PriorityOverride));
            }
        }

        if slot.study_hall {
            let candidate = pool.claim_unsupervised(slot.family, &catalog.study_hall)?;
            Some((slot, candidate, ClaimRule::StudyHallShortTask))
        } else {
            let candidate = pool.claim_by_due_date(slot.family)?;
            Some((slot, candidate, ClaimRule::FamilyMatch))
        }
    }
}

/// Monday of the week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}
