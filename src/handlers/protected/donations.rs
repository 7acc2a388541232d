use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::database::models::Donation;
use crate::error::ApiResult;
use crate::middleware::ApiResponse;
use crate::services::CreateDonationRequest;
use crate::state::AppState;

/// POST /api/donations - record a donation against a fund
///
/// Expected Input:
/// ```json
/// { "fundId": 1, "donorName": "Ana", "amount": 500 }
/// ```
pub async fn donation_post(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDonationRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Donation>> {
    let Json(request) = payload?;
    let donation = state.donations.create(&request).await?;

    Ok(ApiResponse::created(donation))
}

/// DELETE /api/donations/:id - remove a donation permanently
pub async fn donation_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = state.donations.delete(&id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Donation deleted",
        "id": id,
    })))
}
