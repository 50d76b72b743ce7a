use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::autofill::{week_monday, AutoFillError, AutoFillReport, AutoFillScheduler};
use super::catalog::PlannerCatalog;
use super::domain::{Assignment, Family};
use super::placement::{DayPlan, PlacementEngine};
use super::repository::{AssignmentStore, RepositoryError, ScheduleStore};

/// Service composing the stores with the placement engine and weekly scheduler.
pub struct PlannerService<A, S> {
    assignments: Arc<A>,
    schedule: Arc<S>,
    catalog: Arc<PlannerCatalog>,
    engine: PlacementEngine,
    scheduler: AutoFillScheduler,
    in_flight: Mutex<HashSet<String>>,
}

impl<A, S> PlannerService<A, S>
where
    A: AssignmentStore + 'static,
    S: ScheduleStore + 'static,
{
    pub fn new(assignments: Arc<A>, schedule: Arc<S>, catalog: PlannerCatalog) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            assignments,
            schedule,
            engine: PlacementEngine::new(catalog.clone()),
            scheduler: AutoFillScheduler::new(catalog.clone()),
            catalog,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn catalog(&self) -> &PlannerCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &PlacementEngine {
        &self.engine
    }

    /// Loads the student's work and template for `date` and populates the day.
    pub fn day_plan(&self, student: &str, date: NaiveDate) -> Result<DayPlan, PlannerServiceError> {
        let assignments = self.assignments.assignments_for_student(student)?;
        let weekday = date.weekday();
        let blocks: Vec<_> = self
            .schedule
            .blocks_for(student, weekday)?
            .into_iter()
            .filter(|block| block.weekday.applies_to(weekday))
            .collect();

        Ok(self.engine.place(&assignments, &blocks, student, date))
    }

    /// Runs the weekly auto-fill, refusing to overlap a run already in flight
    /// for the same student.
    pub fn auto_fill_week(
        &self,
        student: &str,
        week_start: NaiveDate,
    ) -> Result<AutoFillReport, PlannerServiceError> {
        let _run = InFlightGuard::acquire(&self.in_flight, student)?;
        let report = self.scheduler.run(
            self.assignments.as_ref(),
            self.schedule.as_ref(),
            student,
            week_monday(week_start),
        )?;
        Ok(report)
    }

    pub fn classify(&self, assignment: &Assignment) -> Family {
        self.catalog.classifier().classify(assignment)
    }
}

/// Error raised by the planner service.
#[derive(Debug, thiserror::Error)]
pub enum PlannerServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    AutoFill(#[from] AutoFillError),
    #[error("an auto-fill run for {0} is already in progress")]
    AutoFillInProgress(String),
}

struct InFlightGuard<'a> {
    runs: &'a Mutex<HashSet<String>>,
    key: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(runs: &'a Mutex<HashSet<String>>, student: &str) -> Result<Self, PlannerServiceError> {
        let key = student.trim().to_ascii_lowercase();
        let mut guard = runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !guard.insert(key.clone()) {
            return Err(PlannerServiceError::AutoFillInProgress(student.to_string()));
        }
        Ok(Self { runs, key })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut guard = self
            .runs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.remove(&self.key);
    }
}
