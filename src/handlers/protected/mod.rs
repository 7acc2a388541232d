// handlers/protected/mod.rs - Admin handlers (x-admin-secret required)
//
// The secret is checked by `middleware::admin_secret_middleware`, layered on
// these routes in `server::donation_routes`, before any extractor runs.

pub mod donations;

pub use donations::{donation_delete, donation_post};
