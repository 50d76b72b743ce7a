use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use chrono::{NaiveDate, Weekday};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use study_planner::planning::{
    planner_router, Assignment, AssignmentStore, BlockDay, BlockType, CachedScheduleStore,
    PlacementUpdate, PlannerCatalog, PlannerService, RepositoryError, ScheduleBlock,
    ScheduleStore,
};

#[derive(Default)]
struct Records {
    assignments: Mutex<Vec<Assignment>>,
}

impl AssignmentStore for Records {
    fn assignments_for_student(&self, student: &str) -> Result<Vec<Assignment>, RepositoryError> {
        let records = self.assignments.lock().expect("records lock");
        Ok(records
            .iter()
            .filter(|record| record.owner.eq_ignore_ascii_case(student))
            .cloned()
            .collect())
    }

    fn apply_placement(&self, update: &PlacementUpdate) -> Result<(), RepositoryError> {
        let mut records = self.assignments.lock().expect("records lock");
        let target = update.parent_id.as_ref().unwrap_or(&update.assignment_id);
        let record = records
            .iter_mut()
            .find(|record| &record.id == target)
            .ok_or(RepositoryError::NotFound)?;
        if record.scheduled_date.is_none() {
            record.scheduled_date = Some(update.scheduled_date);
            record.scheduled_block = Some(update.scheduled_block);
        }
        record.detected_family = Some(update.detected_family);
        Ok(())
    }
}

struct Templates {
    days: HashMap<Weekday, Vec<ScheduleBlock>>,
}

impl ScheduleStore for Templates {
    fn blocks_for(
        &self,
        _student: &str,
        weekday: Weekday,
    ) -> Result<Vec<ScheduleBlock>, RepositoryError> {
        Ok(self.days.get(&weekday).cloned().unwrap_or_default())
    }
}

fn block(weekday: Weekday, number: Option<u8>, start: &str, subject: &str, kind: BlockType) -> ScheduleBlock {
    ScheduleBlock {
        id: format!("{weekday}-{start}"),
        student_name: "Khalil".to_string(),
        weekday: BlockDay::On(weekday),
        block_number: number,
        start_time: start.to_string(),
        end_time: start.to_string(),
        subject: subject.to_string(),
        block_name: None,
        block_type: kind,
    }
}

/// Khalil's four-block template; study hall is block 3 every day.
fn khalil_week() -> Templates {
    let days = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
    .into_iter()
    .map(|weekday| {
        (
            weekday,
            vec![
                block(weekday, None, "08:00", "Bible", BlockType::Bible),
                block(weekday, Some(1), "08:30", "", BlockType::Assignment),
                block(weekday, Some(2), "09:30", "", BlockType::Assignment),
                block(weekday, Some(3), "10:30", "Study Hall", BlockType::Assignment),
                block(weekday, None, "11:30", "Lunch", BlockType::Lunch),
                block(weekday, Some(4), "12:30", "", BlockType::Assignment),
            ],
        )
    })
    .collect();
    Templates { days }
}

fn record(id: &str, title: &str, subject: &str, minutes: Option<u32>) -> Assignment {
    let mut assignment = Assignment::new(id, "Khalil", title, subject);
    assignment.actual_estimated_minutes = minutes;
    assignment
}

fn service(records: Vec<Assignment>) -> Arc<PlannerService<Records, CachedScheduleStore<Templates>>> {
    let store = Records {
        assignments: Mutex::new(records),
    };
    Arc::new(PlannerService::new(
        Arc::new(store),
        Arc::new(CachedScheduleStore::new(khalil_week())),
        PlannerCatalog::standard(),
    ))
}

async fn send(
    service: Arc<PlannerService<Records, CachedScheduleStore<Templates>>>,
    request: Request<Body>,
) -> (StatusCode, Value) {
    let response = planner_router(service)
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn weekly_fill_persists_and_the_day_view_follows() {
    let service = service(vec![
        record("hist", "Module 3", "History", Some(100)),
        record("geo", "Solve polygon set", "Geometry", Some(40)),
        record("spell", "Spelling practice", "English", Some(10)),
        record("other", "Read chapter 2", "Literature", None),
    ]);

    let (status, report) = send(
        service.clone(),
        Request::post("/api/v1/planner/students/Khalil/autofill")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "week_start": "2025-01-08" }).to_string(),
            ))
            .expect("request builds"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["week_start"], "2025-01-06");
    let placements = report["placements"].as_array().expect("placements");

    // Monday: Humanities, Analytical, Study Hall, Creative. Module days go one
    // per date, so the five pieces run Monday through Friday.
    assert_eq!(placements[0]["title"], "Module 3 - Day 1");
    assert_eq!(placements[0]["block_number"], 1);
    assert_eq!(placements[1]["assignment_id"], "geo");
    assert_eq!(placements[2]["assignment_id"], "spell");
    assert_eq!(placements[2]["rule"], "study_hall_short_task");

    let module_dates: Vec<&str> = placements
        .iter()
        .filter(|placement| placement["parent_id"] == "hist")
        .filter_map(|placement| placement["date"].as_str())
        .collect();
    assert_eq!(
        module_dates,
        vec!["2025-01-06", "2025-01-07", "2025-01-08", "2025-01-09", "2025-01-10"]
    );
    assert!(placements
        .iter()
        .any(|placement| placement["assignment_id"] == "other"));
    assert_eq!(report["remaining_unplaced"], 0);
    assert_eq!(report["failures"], json!([]));

    let (status, day) = send(
        service,
        Request::get("/api/v1/planner/students/Khalil/days/2025-01-06")
            .body(Body::empty())
            .expect("request builds"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["unscheduled_count"], 0);
    // The module parent, geometry set and spelling show where the run wrote them.
    assert_eq!(day["summary"]["with_assignment"], 3);
    assert_eq!(day["summary"]["with_fallback"], 0);
    assert_eq!(day["blocks"][1]["fill"]["assignment"]["id"], "hist");
    assert_eq!(day["blocks"][1]["fill"]["rule"], "scheduled");
}

#[tokio::test]
async fn second_run_finds_nothing_left_to_place() {
    let service = service(vec![record("geo", "Solve polygon set", "Geometry", None)]);
    let week = NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date");

    let first = service.auto_fill_week("Khalil", week).expect("first run");
    assert_eq!(first.placements.len(), 1);

    let second = service.auto_fill_week("Khalil", week).expect("second run");
    assert!(second.placements.is_empty());
    assert_eq!(second.remaining_unplaced, 0);
}
