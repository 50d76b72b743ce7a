use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::autofill::AutoFillError;
use super::domain::{Assignment, AssignmentId, Family, ScheduleBlock};
use super::placement::{DayPlan, DayPlanSummary};
use super::repository::{AssignmentStore, RepositoryError, ScheduleStore};
use super::service::{PlannerService, PlannerServiceError};

/// Stateless placement request; missing lists are treated as empty.
#[derive(Debug, Deserialize)]
pub struct PlaceRequest {
    pub student: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub assignments: Option<Vec<Assignment>>,
    #[serde(default)]
    pub blocks: Option<Vec<ScheduleBlock>>,
}

#[derive(Debug, Serialize)]
pub struct DayPlanResponse {
    #[serde(flatten)]
    pub plan: DayPlan,
    pub summary: DayPlanSummary,
}

impl From<DayPlan> for DayPlanResponse {
    fn from(plan: DayPlan) -> Self {
        let summary = plan.summary();
        Self { plan, summary }
    }
}

#[derive(Debug, Deserialize)]
pub struct AutoFillRequest {
    pub week_start: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Serialize)]
pub struct ClassifiedAssignment {
    pub id: AssignmentId,
    pub family: Family,
}

/// Router builder exposing placement, day-plan, auto-fill, and classification endpoints.
pub fn planner_router<A, S>(service: Arc<PlannerService<A, S>>) -> Router
where
    A: AssignmentStore + 'static,
    S: ScheduleStore + 'static,
{
    Router::new()
        .route("/api/v1/planner/place", post(place_handler::<A, S>))
        .route("/api/v1/planner/classify", post(classify_handler::<A, S>))
        .route(
            "/api/v1/planner/students/:student/days/:date",
            get(day_plan_handler::<A, S>),
        )
        .route(
            "/api/v1/planner/students/:student/autofill",
            post(autofill_handler::<A, S>),
        )
        .with_state(service)
}

pub(crate) async fn place_handler<A, S>(
    State(service): State<Arc<PlannerService<A, S>>>,
    Json(request): Json<PlaceRequest>,
) -> Response
where
    A: AssignmentStore + 'static,
    S: ScheduleStore + 'static,
{
    let assignments = request.assignments.unwrap_or_default();
    let blocks = request.blocks.unwrap_or_default();
    let plan = service
        .engine()
        .place(&assignments, &blocks, &request.student, request.date);
    (StatusCode::OK, Json(DayPlanResponse::from(plan))).into_response()
}

pub(crate) async fn classify_handler<A, S>(
    State(service): State<Arc<PlannerService<A, S>>>,
    Json(request): Json<ClassifyRequest>,
) -> Response
where
    A: AssignmentStore + 'static,
    S: ScheduleStore + 'static,
{
    let classified: Vec<ClassifiedAssignment> = request
        .assignments
        .iter()
        .map(|assignment| ClassifiedAssignment {
            id: assignment.id.clone(),
            family: service.classify(assignment),
        })
        .collect();
    (StatusCode::OK, Json(classified)).into_response()
}

pub(crate) async fn day_plan_handler<A, S>(
    State(service): State<Arc<PlannerService<A, S>>>,
    Path((student, date)): Path<(String, String)>,
) -> Response
where
    A: AssignmentStore + 'static,
    S: ScheduleStore + 'static,
{
    let date = match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            let payload = json!({
                "error": format!("'{date}' is not a YYYY-MM-DD date"),
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    match service.day_plan(&student, date) {
        Ok(plan) => (StatusCode::OK, Json(DayPlanResponse::from(plan))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn autofill_handler<A, S>(
    State(service): State<Arc<PlannerService<A, S>>>,
    Path(student): Path<String>,
    Json(request): Json<AutoFillRequest>,
) -> Response
where
    A: AssignmentStore + 'static,
    S: ScheduleStore + 'static,
{
    match service.auto_fill_week(&student, request.week_start) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: PlannerServiceError) -> Response {
    let status = match &error {
        PlannerServiceError::AutoFillInProgress(_) => StatusCode::CONFLICT,
        PlannerServiceError::Repository(RepositoryError::Unavailable(_))
        | PlannerServiceError::AutoFill(AutoFillError::StoreUnreachable(_))
        | PlannerServiceError::AutoFill(AutoFillError::LoadAssignments { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PlannerServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        PlannerServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
