// HTTP API Error Types
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::bootstrap::BootError;
use crate::database::manager::DatabaseError;
use crate::services::{DonationError, FundError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["field_errors"] = json!(field_errors);
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError

/// Header-gated endpoints: a missing secret is 401, a wrong one 403.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Missing => ApiError::unauthorized("Admin secret required"),
            AuthError::Mismatch => ApiError::forbidden("Invalid admin secret"),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
            | DatabaseError::Sqlx(sqlx::Error::PoolClosed)
            | DatabaseError::Sqlx(sqlx::Error::Io(_)) => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            other => {
                // Log the real error but return generic message
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<FundError> for ApiError {
    fn from(err: FundError) -> Self {
        match err {
            FundError::NotFound(id) => ApiError::not_found(format!("Fund {} not found", id)),
            FundError::InvalidId(raw) => ApiError::bad_request(format!("Invalid fund id: {}", raw)),
            FundError::Database(e) => e.into(),
        }
    }
}

impl From<DonationError> for ApiError {
    fn from(err: DonationError) -> Self {
        match err {
            DonationError::Validation(field_errors) => {
                ApiError::validation_error("Invalid donation fields", Some(field_errors))
            }
            DonationError::FundNotFound(id) => {
                ApiError::not_found(format!("Fund {} not found", id))
            }
            DonationError::NotFound(id) => {
                ApiError::not_found(format!("Donation {} not found", id))
            }
            DonationError::InvalidId(raw) => {
                ApiError::bad_request(format!("Invalid donation id: {}", raw))
            }
            DonationError::Database(e) => e.into(),
        }
    }
}

impl From<BootError> for ApiError {
    fn from(err: BootError) -> Self {
        tracing::error!("Request refused, store not ready: {}", err);
        ApiError::service_unavailable("Service is not available")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge("Request body too large".to_string());
        }
        ApiError::invalid_json(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
