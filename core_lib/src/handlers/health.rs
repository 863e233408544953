//! Liveness endpoint

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::warn;

/// Reports healthy while the storage root exists or can be created.
pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let (status_code, status) = match state.storage.ensure_root().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            warn!(
                storage_root = %state.storage.root().display(),
                error = %e,
                "storage root is not usable"
            );
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    let body = serde_json::json!({
        "status": status,
        "version": state.version,
        "timestamp": chrono::Utc::now().timestamp(),
    });

    (status_code, Json(body))
}
