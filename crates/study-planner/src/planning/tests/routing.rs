use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::planning::repository::RepositoryError;
use crate::planning::{planner_router, PlannerService};

#[tokio::test]
async fn place_route_populates_posted_blocks() {
    let (service, _) = build_service(Vec::new());
    let body = json!({
        "student": "Abigail",
        "date": "2025-01-06",
        "assignments": [
            { "id": "a1", "title": "Solve set 4", "subject": "Math", "due_date": "2025-01-05" },
            { "id": "a2", "title": "Read chapter 3", "subject": "History" },
            { "id": "a3", "title": "Essay draft", "subject": "English", "completion_status": "completed" }
        ],
        "blocks": [
            { "id": "b3", "student_name": "Abigail", "weekday": "Monday", "block_number": 3,
              "start_time": "10:15", "end_time": "11:00", "block_type": "Assignment" },
            { "id": "b1", "student_name": "Abigail", "weekday": "Monday", "block_number": 1,
              "start_time": "08:30", "end_time": "09:15", "block_type": "Assignment" },
            { "id": "lunch", "student_name": "Abigail", "weekday": "Full Week",
              "start_time": "11:30", "end_time": "12:15", "block_type": "Lunch", "subject": "Lunch" }
        ]
    });

    let response = planner_router(service)
        .oneshot(json_request("POST", "/api/v1/planner/place", &body))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = read_json(response).await;
    let blocks = payload["blocks"].as_array().expect("blocks array");
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0]["block"]["id"], "b1");
    assert_eq!(blocks[0]["fill"]["kind"], "assignment");
    assert_eq!(blocks[0]["fill"]["assignment"]["id"], "a1");
    assert_eq!(blocks[0]["fill"]["rule"], "family_match");
    assert_eq!(blocks[1]["family"], "Composition");
    assert_eq!(blocks[1]["fill"]["kind"], "empty");
    assert!(blocks[2]["family"].is_null());
    assert_eq!(payload["unscheduled_count"], 1);
    assert_eq!(payload["summary"]["with_assignment"], 1);
    assert_eq!(payload["summary"]["pass_through"], 1);
}

#[tokio::test]
async fn place_route_skips_completed_work_in_any_casing() {
    let (service, _) = build_service(Vec::new());
    let body = json!({
        "student": "Abigail",
        "date": "2025-01-06",
        "assignments": [
            { "id": "a1", "title": "Solve set 4", "subject": "Math", "completion_status": "Completed" },
            { "id": "a2", "title": "Solve set 5", "subject": "Math", "completion_status": "DONE" }
        ],
        "blocks": [
            { "id": "b1", "student_name": "Abigail", "weekday": "Monday", "block_number": 1,
              "start_time": "08:30", "end_time": "09:15", "block_type": "Assignment" }
        ]
    });

    let response = planner_router(service)
        .oneshot(json_request("POST", "/api/v1/planner/place", &body))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = read_json(response).await;
    assert_eq!(payload["blocks"][0]["fill"]["kind"], "empty");
    assert_eq!(payload["unscheduled_count"], 0);
    assert_eq!(payload["summary"]["with_assignment"], 0);
}

#[tokio::test]
async fn place_route_treats_missing_lists_as_empty() {
    let (service, _) = build_service(Vec::new());
    let body = json!({ "student": "Abigail", "date": "2025-01-06", "blocks": null });

    let response = planner_router(service)
        .oneshot(json_request("POST", "/api/v1/planner/place", &body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["blocks"], json!([]));
    assert_eq!(payload["unscheduled_count"], 0);
}

#[tokio::test]
async fn day_route_returns_the_stored_plan() {
    let (service, _) = build_service(vec![assignment("a2", "Read chapter 3", "History")]);

    let response = planner_router(service)
        .oneshot(
            Request::get("/api/v1/planner/students/Abigail/days/2025-01-06")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["student"], "Abigail");
    assert_eq!(payload["summary"]["with_assignment"], 1);
    assert_eq!(payload["summary"]["with_fallback"], 1);
}

#[tokio::test]
async fn day_route_rejects_malformed_dates() {
    let (service, _) = build_service(Vec::new());

    let response = planner_router(service)
        .oneshot(
            Request::get("/api/v1/planner/students/Abigail/days/next-monday")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("next-monday"));
}

#[tokio::test]
async fn day_route_maps_store_outage_to_service_unavailable() {
    let service = Arc::new(PlannerService::new(
        Arc::new(MemoryAssignmentStore::unreadable()),
        Arc::new(MemoryScheduleStore::week()),
        catalog(),
    ));

    let response = planner_router(service)
        .oneshot(
            Request::get("/api/v1/planner/students/Abigail/days/2025-01-06")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn autofill_route_returns_the_report() {
    let (service, store) = build_service(vec![
        minutes(assignment("m5", "Module 5", "History"), 100),
        assignment("s1", "Solve set 1", "Math"),
    ]);

    let response = planner_router(service)
        .oneshot(json_request(
            "POST",
            "/api/v1/planner/students/Abigail/autofill",
            &json!({ "week_start": "2025-01-06" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(payload["week_start"], "2025-01-06");
    assert_eq!(payload["placements"].as_array().map(Vec::len), Some(6));
    assert_eq!(payload["placements"][0]["assignment_id"], "s1");
    assert_eq!(payload["placements"][0]["rule"], "family_match");
    assert_eq!(store.writes().len(), 6);
}

#[tokio::test]
async fn autofill_route_maps_unreachable_store_to_503() {
    let service = Arc::new(PlannerService::new(
        Arc::new(MemoryAssignmentStore::failing(
            vec![assignment("s1", "Solve set 1", "Math")],
            WriteFailure::Always(RepositoryError::Unavailable("offline".to_string())),
        )),
        Arc::new(MemoryScheduleStore::week()),
        catalog(),
    ));

    let response = planner_router(service)
        .oneshot(json_request(
            "POST",
            "/api/v1/planner/students/Abigail/autofill",
            &json!({ "week_start": "2025-01-06" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn autofill_route_returns_conflict_while_a_run_is_in_flight() {
    let (store, gate) = GateStore::new(vec![assignment("s1", "Solve set 1", "Math")]);
    let service = Arc::new(PlannerService::new(
        Arc::new(store),
        Arc::new(MemoryScheduleStore::week()),
        catalog(),
    ));

    let background = {
        let service = service.clone();
        std::thread::spawn(move || service.auto_fill_week(STUDENT, monday()))
    };
    gate.entered.recv().expect("first run reaches the store");

    let response = planner_router(service)
        .oneshot(json_request(
            "POST",
            "/api/v1/planner/students/Abigail/autofill",
            &json!({ "week_start": "2025-01-06" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    gate.release.send(()).expect("release first run");
    background
        .join()
        .expect("thread completes")
        .expect("first run succeeds");
}

#[tokio::test]
async fn classify_route_labels_each_assignment() {
    let (service, _) = build_service(Vec::new());
    let body = json!({
        "assignments": [
            { "id": "p1", "title": "Create a timeline poster", "subject": "History",
              "course_name": "American History" },
            { "id": "p2", "title": "Lesson 12", "subject": "Grammar" }
        ]
    });

    let response = planner_router(service)
        .oneshot(json_request("POST", "/api/v1/planner/classify", &body))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json(response).await;
    assert_eq!(
        payload,
        json!([
            { "id": "p1", "family": "Creative" },
            { "id": "p2", "family": "Composition" }
        ])
    );
}
