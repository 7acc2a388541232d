use serde::Serialize;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{Account, Donation, Fund};
use crate::database::service;
use crate::services::aggregation::{self, FundTotals};

#[derive(Debug, thiserror::Error)]
pub enum FundError {
    #[error("Fund not found: {0}")]
    NotFound(i64),
    #[error("Invalid fund id: {0}")]
    InvalidId(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Display fields of a fund as the public page needs them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub target_amount: f64,
}

impl From<Fund> for FundSummary {
    fn from(fund: Fund) -> Self {
        Self {
            id: fund.id,
            name: fund.name,
            description: fund.description,
            photo_url: fund.photo_url,
            target_amount: fund.target_amount,
        }
    }
}

/// Body of `GET /api/fund`
#[derive(Debug, Clone, Serialize)]
pub struct FundOverview {
    pub fund: FundSummary,
    pub donations: Vec<Donation>,
    /// Derived totals; the field name is kept for existing clients
    pub account: FundTotals,
    pub accounts: Vec<Account>,
}

pub struct FundService {
    db: Database,
    active_fund_id: i64,
}

impl FundService {
    pub fn new(db: Database, active_fund_id: i64) -> Self {
        Self { db, active_fund_id }
    }

    /// Pick the fund a read refers to: an explicit `id` or the configured one.
    pub fn resolve_fund_id(&self, requested: Option<&str>) -> Result<i64, FundError> {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(self.active_fund_id),
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) if id > 0 => Ok(id),
                _ => Err(FundError::InvalidId(raw.to_string())),
            },
        }
    }

    /// Fund, its donations and totals recomputed from the current rows
    pub async fn overview(&self, fund_id: i64) -> Result<FundOverview, FundError> {
        let fund = service::find_fund(&self.db, fund_id)
            .await?
            .ok_or(FundError::NotFound(fund_id))?;

        let donations = service::list_donations(&self.db, fund_id).await?;
        let accounts = service::list_accounts(&self.db).await?;
        let totals = aggregation::totals(&fund, &donations);

        Ok(FundOverview {
            fund: fund.into(),
            donations,
            account: totals,
            accounts,
        })
    }
}
