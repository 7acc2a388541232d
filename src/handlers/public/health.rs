use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::bootstrap::BootState;
use crate::state::AppState;

/// GET / - liveness only, never touches storage
pub async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "env": state.config.environment.as_str(),
    }))
}

/// GET /health - bootstrap state plus a store ping
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let boot = state.bootstrap.state();

    // Only ping once ready; during sync the pool may be busy migrating
    let database = if boot == BootState::Ready {
        match state.db.health_check().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::error!("Health check database ping failed: {}", e);
                "unavailable"
            }
        }
    } else {
        "pending"
    };

    let healthy = boot == BootState::Ready && database == "ok";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "degraded" },
            "bootstrap": boot.as_str(),
            "database": database,
            "timestamp": chrono::Utc::now(),
        })),
    )
}
