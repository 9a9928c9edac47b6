//! Access log for the upload endpoints.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use crate::api::identity;

pub async fn audit(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let user = identity::uploaded_by(request.headers());
    let ip = identity::client_ip(request.headers());
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        user = user.as_deref().unwrap_or("-"),
        ip = ip.as_deref().unwrap_or("-"),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}
