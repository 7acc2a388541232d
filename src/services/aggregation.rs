use serde::{Deserialize, Serialize};

use crate::database::models::{Donation, Fund};

/// Totals derived from a fund's current donations. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundTotals {
    pub total_raised: f64,
    /// Negative once donations exceed the target
    pub remaining: f64,
}

/// Sum the donations and compare against the fund's target.
pub fn totals(fund: &Fund, donations: &[Donation]) -> FundTotals {
    totals_for(fund.target_amount, donations.iter().map(|d| d.amount))
}

pub fn totals_for(target_amount: f64, amounts: impl IntoIterator<Item = f64>) -> FundTotals {
    let total_raised: f64 = amounts.into_iter().sum();
    FundTotals {
        total_raised,
        remaining: target_amount - total_raised,
    }
}
