use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Reports whether the record source is reachable; 503 otherwise, so load
/// balancers can take the instance out of rotation without crashing it.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.count().await {
        Ok(count) => {
            (StatusCode::OK, Json(json!({ "status": "ok", "congresses": count }))).into_response()
        }
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "message": "Data unavailable" })),
            )
                .into_response()
        }
    }
}

// Version/Build info endpoint (JSON)
pub async fn version() -> impl IntoResponse {
    let body = json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
