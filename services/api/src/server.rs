use crate::cli::ServeArgs;
use crate::demo::{seed_assignments, seed_templates};
use crate::infra::{AppState, InMemoryAssignmentStore, InMemoryScheduleStore};
use crate::routes::with_planner_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use study_planner::config::AppConfig;
use study_planner::error::AppError;
use study_planner::planning::{CachedScheduleStore, PlannerService};
use study_planner::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let catalog = config.planner.catalog()?;
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let assignments = Arc::new(InMemoryAssignmentStore::with_records(seed_assignments()));
    let schedule = Arc::new(CachedScheduleStore::new(InMemoryScheduleStore::from_blocks(
        seed_templates(),
    )));
    let planner = Arc::new(PlannerService::new(assignments, schedule, catalog));

    let app = with_planner_routes(planner)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        environment = ?config.environment,
        catalog = ?config.planner.catalog_path,
        %addr,
        "study planner ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
