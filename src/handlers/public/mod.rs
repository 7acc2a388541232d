// handlers/public/mod.rs - Public handlers (no admin secret required)

pub mod fund;
pub mod health;
pub mod login;

pub use fund::fund_get;
pub use health::{health, root};
pub use login::login_post;
