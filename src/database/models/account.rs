use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Bank transfer details shown next to the fund. Display data only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub bank_name: String,
    pub account_number: String,
    pub beneficiary_name: String,
}
