use axum::Json;

use crate::models::HealthResponse;

/// `GET /health`: liveness probe.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: leelu_core::version(),
    })
}
