/**
 * API HTTP VIGIL - Endpoint de santé de la sonde
 *
 * ROLE:
 * Exposes the aggregate verdict to load balancers and supervisors.
 *
 * HOW IT WORKS:
 * - Axum router with a single GET /health route
 * - The handler copies the snapshot store (read lock released right away)
 *   and only then serializes, so a slow client never holds up collectors
 * - 200 when every metric is OK, 503 as soon as one is KO
 */

use crate::health::HealthReport;
use crate::models::Status;
use crate::state::SnapshotStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .with_state(app_state)
}

pub fn status_code(status: Status) -> StatusCode {
    match status {
        Status::Ok => StatusCode::OK,
        Status::Ko => StatusCode::SERVICE_UNAVAILABLE,
    }
}

// GET /health
pub async fn get_health(State(app): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = HealthReport::from_snapshot(app.store.snapshot());
    debug!(status = %report.status, metrics = report.metrics.len(), "health requested");
    (status_code(report.status), Json(report))
}
