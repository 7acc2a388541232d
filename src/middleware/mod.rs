pub mod admin;
pub mod rate_limit;
pub mod ready;
pub mod response;

pub use admin::admin_secret_middleware;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use ready::require_ready_middleware;
pub use response::{ApiResponse, NO_STORE};
