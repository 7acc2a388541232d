use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::ADMIN_SECRET_HEADER;
use crate::error::ApiError;
use crate::state::AppState;

/// Admin gate for mutating routes. Runs before the body is read, so a rejected
/// request never reaches the store.
pub async fn admin_secret_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(ADMIN_SECRET_HEADER)
        .map(|v| v.as_bytes());

    if let Err(err) = state.admin.verify(presented) {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Admin request rejected: {}",
            err
        );
        return ApiError::from(err).into_response();
    }

    next.run(request).await
}
