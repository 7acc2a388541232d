use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// Value for responses that must always reflect current state
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate";

/// JSON response with an explicit status and optional cache policy
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: StatusCode,
    pub no_store: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: StatusCode::OK,
            no_store: false,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            ..Self::success(data)
        }
    }

    /// Forbid caches and intermediaries from keeping this response
    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut response = (self.status_code, Json(self.data)).into_response();
        if self.no_store {
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
        }
        response
    }
}
