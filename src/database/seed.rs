use tracing::info;

use super::manager::{Database, DatabaseError};
use super::service;

pub const SEED_FUND_NAME: &str = "Fundraiser";
pub const SEED_FUND_DESCRIPTION: &str = "Initial seed";
pub const SEED_FUND_PHOTO_URL: &str = "https://via.placeholder.com/600x200";
pub const SEED_FUND_TARGET: f64 = 2000.0;

const SEED_ACCOUNT_ID: i64 = 1;

/// What the seed step actually wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub fund_created: bool,
    pub account_created: bool,
}

/// Ensure the active fund and a display account exist. Safe to run on every start.
pub async fn seed(db: &Database, fund_id: i64) -> Result<SeedReport, DatabaseError> {
    let fund_created = service::insert_fund_if_absent(
        db,
        fund_id,
        SEED_FUND_NAME,
        Some(SEED_FUND_DESCRIPTION),
        Some(SEED_FUND_PHOTO_URL),
        SEED_FUND_TARGET,
    )
    .await?;

    let account_created = service::insert_account_if_absent(
        db,
        SEED_ACCOUNT_ID,
        "Example Bank",
        "1234-5678-9012-3456",
        "Example Organization",
    )
    .await?;

    if fund_created {
        info!("Seeded fund {} with target {}", fund_id, SEED_FUND_TARGET);
    }
    if account_created {
        info!("Seeded display account {}", SEED_ACCOUNT_ID);
    }

    Ok(SeedReport { fund_created, account_created })
}
