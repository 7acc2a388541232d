use std::sync::Arc;

use crate::auth::AdminGate;
use crate::bootstrap::Bootstrap;
use crate::config::AppConfig;
use crate::database::manager::{Database, DatabaseError};
use crate::middleware::RateLimiter;
use crate::services::{DonationService, FundService};

/// Everything a handler can reach. Built once per process and shared behind an `Arc`.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub bootstrap: Bootstrap,
    pub admin: AdminGate,
    pub limiter: RateLimiter,
    pub funds: FundService,
    pub donations: DonationService,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Arc<Self>, DatabaseError> {
        let db = Database::connect_lazy(&config.database)?;

        let admin = AdminGate::new(config.security.admin_secret.as_deref());
        if !admin.is_configured() {
            tracing::warn!("ADMIN_SECRET is not set; admin endpoints will reject every request");
        }

        Ok(Arc::new(Self {
            limiter: RateLimiter::from_config(&config.api),
            funds: FundService::new(db.clone(), config.fund.active_fund_id),
            donations: DonationService::new(db.clone()),
            bootstrap: Bootstrap::new(),
            admin,
            db,
            config,
        }))
    }
}
