//! HTTP surface for landmark bulk uploads.
//!
//! Handlers stay thin: every call into the library touches SQLite or the
//! filesystem, so it runs on the blocking pool.

pub mod api;
pub mod audit;
pub mod state;
pub mod telemetry;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes;

    let masterdata = Router::new()
        .route(
            "/api/masterdata/landmarks",
            post(api::uploads::upload_landmarks).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/masterdata/landmarks/status/{job_id}",
            get(api::jobs::job_status),
        )
        .route(
            "/api/masterdata/landmarks/failures/{job_id}",
            get(api::jobs::job_failures),
        )
        .layer(middleware::from_fn(audit::audit));

    let mut app = masterdata.route("/health", get(api::health));
    if state.metrics.is_some() {
        app = app.route("/metrics", get(api::metrics));
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}
