use serde::{Deserialize, Serialize};
use sqlx::{any::AnyRow, FromRow, Row};

/// Columns to select for a `Fund`. The `Any` driver cannot decode NULL text,
/// so optional columns come back coalesced to an empty string.
pub const FUND_COLUMNS: &str = "id, name, \
     COALESCE(description, '') AS description, \
     COALESCE(photo_url, '') AS photo_url, \
     target_amount, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub target_amount: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl<'r> FromRow<'r, AnyRow> for Fund {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: optional_text(row, "description")?,
            photo_url: optional_text(row, "photo_url")?,
            target_amount: row.try_get("target_amount")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

// Empty and NULL both mean "not set"
fn optional_text(row: &AnyRow, column: &str) -> Result<Option<String>, sqlx::Error> {
    let value: String = row.try_get(column)?;
    Ok(Some(value).filter(|v| !v.is_empty()))
}
