use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::AuthError;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub secret: Option<String>,
}

/// POST /api/admin/login - check an admin secret without granting a session
///
/// Missing secret is 400, a wrong one 401. Clients keep sending the secret in
/// `x-admin-secret` on every mutating call afterwards.
pub async fn login_post(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(payload) = payload?;

    match state.admin.verify(payload.secret.as_deref().map(str::as_bytes)) {
        Ok(()) => Ok(Json(json!({
            "success": true,
            "message": "Authenticated",
        }))),
        Err(AuthError::Missing) => Err(ApiError::bad_request("Admin secret required")),
        Err(AuthError::Mismatch) => {
            tracing::warn!("Admin login rejected");
            Err(ApiError::unauthorized("Invalid admin secret"))
        }
    }
}
