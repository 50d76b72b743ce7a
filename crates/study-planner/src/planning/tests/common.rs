use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::response::Response;
use chrono::{NaiveDate, Weekday};
use serde_json::Value;

use crate::planning::domain::{Assignment, AssignmentId, BlockDay, BlockType, ScheduleBlock};
use crate::planning::repository::{
    AssignmentStore, PlacementUpdate, RepositoryError, ScheduleStore,
};
use crate::planning::{PlannerCatalog, PlannerService};

pub(super) const STUDENT: &str = "Abigail";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// 2025-01-06 is a Monday.
pub(super) fn monday() -> NaiveDate {
    date(2025, 1, 6)
}

pub(super) fn assignment(id: &str, title: &str, subject: &str) -> Assignment {
    Assignment::new(id, "student-1", title, subject)
}

pub(super) fn due(mut assignment: Assignment, due: NaiveDate) -> Assignment {
    assignment.due_date = Some(due);
    assignment
}

pub(super) fn minutes(mut assignment: Assignment, minutes: u32) -> Assignment {
    assignment.actual_estimated_minutes = Some(minutes);
    assignment
}

pub(super) fn numbered_block(
    id: &str,
    weekday: Weekday,
    number: u8,
    start: &str,
    end: &str,
) -> ScheduleBlock {
    ScheduleBlock {
        id: id.to_string(),
        student_name: STUDENT.to_string(),
        weekday: BlockDay::On(weekday),
        block_number: Some(number),
        start_time: start.to_string(),
        end_time: end.to_string(),
        subject: String::new(),
        block_name: None,
        block_type: BlockType::Assignment,
    }
}

pub(super) fn study_hall_block(
    id: &str,
    weekday: Weekday,
    number: u8,
    start: &str,
    end: &str,
) -> ScheduleBlock {
    ScheduleBlock {
        subject: "Study Hall".to_string(),
        ..numbered_block(id, weekday, number, start, end)
    }
}

pub(super) fn fixed_block(id: &str, block_type: BlockType, start: &str, end: &str) -> ScheduleBlock {
    ScheduleBlock {
        id: id.to_string(),
        student_name: STUDENT.to_string(),
        weekday: BlockDay::EveryDay,
        block_number: None,
        start_time: start.to_string(),
        end_time: end.to_string(),
        subject: block_type.label().to_string(),
        block_name: None,
        block_type,
    }
}

/// Abigail's full template for one weekday: five numbered blocks with study
/// hall in position four, plus Bible and Lunch.
pub(super) fn school_day(weekday: Weekday) -> Vec<ScheduleBlock> {
    let tag = crate::planning::domain::weekday_name(weekday).to_ascii_lowercase();
    vec![
        fixed_block(&format!("{tag}-bible"), BlockType::Bible, "08:00", "08:30"),
        numbered_block(&format!("{tag}-1"), weekday, 1, "08:30", "09:15"),
        numbered_block(&format!("{tag}-2"), weekday, 2, "09:15", "10:00"),
        numbered_block(&format!("{tag}-3"), weekday, 3, "10:15", "11:00"),
        study_hall_block(&format!("{tag}-4"), weekday, 4, "11:00", "11:30"),
        fixed_block(&format!("{tag}-lunch"), BlockType::Lunch, "11:30", "12:15"),
        numbered_block(&format!("{tag}-5"), weekday, 5, "12:15", "13:00"),
    ]
}

pub(super) fn catalog() -> PlannerCatalog {
    PlannerCatalog::standard()
}

/// Which writes the fake assignment store refuses.
#[derive(Debug, Clone, Default)]
pub(super) enum WriteFailure {
    #[default]
    Never,
    Ids(HashSet<String>, RepositoryError),
    Always(RepositoryError),
}

#[derive(Debug, Default)]
pub(super) struct MemoryAssignmentStore {
    records: Mutex<Vec<Assignment>>,
    writes: Mutex<Vec<PlacementUpdate>>,
    failure: WriteFailure,
    unreadable: bool,
}

impl MemoryAssignmentStore {
    pub(super) fn with(records: Vec<Assignment>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub(super) fn failing(records: Vec<Assignment>, failure: WriteFailure) -> Self {
        Self {
            records: Mutex::new(records),
            failure,
            ..Self::default()
        }
    }

    pub(super) fn unreadable() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }

    pub(super) fn writes(&self) -> Vec<PlacementUpdate> {
        self.writes.lock().expect("writes mutex").clone()
    }

    pub(super) fn record(&self, id: &str) -> Option<Assignment> {
        self.records
            .lock()
            .expect("records mutex")
            .iter()
            .find(|record| record.id.as_str() == id)
            .cloned()
    }
}

impl AssignmentStore for MemoryAssignmentStore {
    fn assignments_for_student(&self, _student: &str) -> Result<Vec<Assignment>, RepositoryError> {
        if self.unreadable {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        Ok(self.records.lock().expect("records mutex").clone())
    }

    fn apply_placement(&self, update: &PlacementUpdate) -> Result<(), RepositoryError> {
        match &self.failure {
            WriteFailure::Always(error) => return Err(error.clone()),
            WriteFailure::Ids(ids, error) if ids.contains(update.assignment_id.as_str()) => {
                return Err(error.clone())
            }
            _ => {}
        }

        self.writes.lock().expect("writes mutex").push(update.clone());
        let target = update.parent_id.as_ref().unwrap_or(&update.assignment_id);
        let mut records = self.records.lock().expect("records mutex");
        if let Some(record) = records.iter_mut().find(|record| &record.id == target) {
            if update.parent_id.is_none() || record.scheduled_date.is_none() {
                record.scheduled_date = Some(update.scheduled_date);
                record.scheduled_block = Some(update.scheduled_block);
            }
            record.detected_family = Some(update.detected_family);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryScheduleStore {
    days: HashMap<Weekday, Vec<ScheduleBlock>>,
    broken: HashSet<Weekday>,
    reads: Mutex<usize>,
}

impl MemoryScheduleStore {
    pub(super) fn week() -> Self {
        let days = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .map(|weekday| (weekday, school_day(weekday)))
        .collect();
        Self {
            days,
            ..Self::default()
        }
    }

    pub(super) fn with_day(weekday: Weekday, blocks: Vec<ScheduleBlock>) -> Self {
        Self {
            days: HashMap::from([(weekday, blocks)]),
            ..Self::default()
        }
    }

    pub(super) fn broken_on(mut self, weekday: Weekday) -> Self {
        self.broken.insert(weekday);
        self
    }

    pub(super) fn reads(&self) -> usize {
        *self.reads.lock().expect("reads mutex")
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn blocks_for(
        &self,
        _student: &str,
        weekday: Weekday,
    ) -> Result<Vec<ScheduleBlock>, RepositoryError> {
        *self.reads.lock().expect("reads mutex") += 1;
        if self.broken.contains(&weekday) {
            return Err(RepositoryError::Unavailable("template service down".to_string()));
        }
        Ok(self.days.get(&weekday).cloned().unwrap_or_default())
    }
}

pub(super) fn build_service(
    records: Vec<Assignment>,
) -> (
    Arc<PlannerService<MemoryAssignmentStore, MemoryScheduleStore>>,
    Arc<MemoryAssignmentStore>,
) {
    let store = Arc::new(MemoryAssignmentStore::with(records));
    let service = Arc::new(PlannerService::new(
        store.clone(),
        Arc::new(MemoryScheduleStore::week()),
        catalog(),
    ));
    (service, store)
}

pub(super) fn ids(values: &[&str]) -> HashSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn id(value: &str) -> AssignmentId {
    AssignmentId::new(value)
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    serde_json::from_slice(&bytes).expect("valid json")
}

pub(super) fn json_request(method: &str, uri: &str, body: &Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(body).expect("serializable body"),
        ))
        .expect("request builds")
}

/// Blocks the first assignment read until the test releases it, so a run can
/// be held in flight.
pub(super) struct GateStore {
    records: Vec<Assignment>,
    entered: Mutex<Option<std::sync::mpsc::Sender<()>>>,
    release: Mutex<std::sync::mpsc::Receiver<()>>,
}

pub(super) struct Gate {
    pub(super) entered: std::sync::mpsc::Receiver<()>,
    pub(super) release: std::sync::mpsc::Sender<()>,
}

impl GateStore {
    pub(super) fn new(records: Vec<Assignment>) -> (Self, Gate) {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let store = Self {
            records,
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
        };
        (
            store,
            Gate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }
}

impl AssignmentStore for GateStore {
    fn assignments_for_student(&self, _student: &str) -> Result<Vec<Assignment>, RepositoryError> {
        let first = self.entered.lock().expect("gate mutex").take();
        if let Some(entered) = first {
            entered.send(()).expect("test is waiting");
            self.release
                .lock()
                .expect("gate mutex")
                .recv()
                .expect("test releases the gate");
        }
        Ok(self.records.clone())
    }

    fn apply_placement(&self, _update: &PlacementUpdate) -> Result<(), RepositoryError> {
        Ok(())
    }
}
