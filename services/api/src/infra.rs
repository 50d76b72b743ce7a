use chrono::{NaiveDate, Weekday};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use study_planner::planning::{
    Assignment, AssignmentStore, PlacementUpdate, RepositoryError, ScheduleBlock, ScheduleStore,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Assignment records keyed by nothing more than insertion order, like an export.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAssignmentStore {
    records: Arc<Mutex<Vec<Assignment>>>,
}

impl InMemoryAssignmentStore {
    pub(crate) fn with_records(records: Vec<Assignment>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Assignment>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("assignment store lock poisoned".to_string()))
    }
}

impl AssignmentStore for InMemoryAssignmentStore {
    fn assignments_for_student(&self, student: &str) -> Result<Vec<Assignment>, RepositoryError> {
        let student = student.trim();
        Ok(self
            .lock()?
            .iter()
            .filter(|record| record.owner.eq_ignore_ascii_case(student))
            .cloned()
            .collect())
    }

    /// Module days are stored as their own placed rows; the parent row takes
    /// the first day's slot so it drops out of the unplaced pool.
    fn apply_placement(&self, update: &PlacementUpdate) -> Result<(), RepositoryError> {
        let mut records = self.lock()?;

        let Some(parent_id) = &update.parent_id else {
            let record = records
                .iter_mut()
                .find(|record| record.id == update.assignment_id)
                .ok_or(RepositoryError::NotFound)?;
            record.scheduled_date = Some(update.scheduled_date);
            record.scheduled_block = Some(update.scheduled_block);
            record.detected_family = Some(update.detected_family);
            return Ok(());
        };

        let parent = records
            .iter_mut()
            .find(|record| &record.id == parent_id)
            .ok_or(RepositoryError::NotFound)?;
        if parent.scheduled_date.is_none() || parent.scheduled_block.is_none() {
            parent.scheduled_date = Some(update.scheduled_date);
            parent.scheduled_block = Some(update.scheduled_block);
        }
        parent.detected_family = Some(update.detected_family);

        let mut piece = parent.clone();
        piece.id = update.assignment_id.clone();
        piece.title = update.title.clone();
        piece.parent_id = Some(parent_id.clone());
        piece.scheduled_date = Some(update.scheduled_date);
        piece.scheduled_block = Some(update.scheduled_block);
        piece.actual_estimated_minutes = update.estimated_minutes;

        match records.iter_mut().find(|record| record.id == piece.id) {
            Some(existing) => *existing = piece,
            None => records.push(piece),
        }
        Ok(())
    }
}

/// Weekly templates per student, as entered by the parent.
#[derive(Default, Clone)]
pub(crate) struct InMemoryScheduleStore {
    templates: Arc<HashMap<String, Vec<ScheduleBlock>>>,
}

impl InMemoryScheduleStore {
    pub(crate) fn from_blocks(blocks: Vec<ScheduleBlock>) -> Self {
        let mut templates: HashMap<String, Vec<ScheduleBlock>> = HashMap::new();
        for block in blocks {
            templates
                .entry(student_key(&block.student_name))
                .or_default()
                .push(block);
        }
        Self {
            templates: Arc::new(templates),
        }
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn blocks_for(
        &self,
        student: &str,
        weekday: Weekday,
    ) -> Result<Vec<ScheduleBlock>, RepositoryError> {
        Ok(self
            .templates
            .get(&student_key(student))
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|block| block.weekday.applies_to(weekday))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn student_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
