// handlers/mod.rs - Two-tier handler layout
//
// Public (no credential) and protected (admin secret in `x-admin-secret`).
pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
