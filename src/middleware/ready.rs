use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Hold storage-touching requests until the bootstrap sequencer settles.
pub async fn require_ready_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(err) = state.bootstrap.wait_ready().await {
        return ApiError::from(err).into_response();
    }

    next.run(request).await
}
