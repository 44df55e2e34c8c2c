//! Health check endpoint.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /health` — always succeeds, no auth required.
///
/// Reports degraded mode in the message but never fails on it.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let message = if state.provider_configured {
        format!("Companion backend v{} is running", companion_core::version())
    } else {
        format!(
            "Companion backend v{} is running (chat provider not configured)",
            companion_core::version()
        )
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        message,
    })
}
