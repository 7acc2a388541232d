use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: i64,
    pub fund_id: i64,
    pub donor_name: String,
    pub amount: f64,
    pub created_at: String,
}

/// A validated donation that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    pub fund_id: i64,
    pub donor_name: String,
    pub amount: f64,
}
