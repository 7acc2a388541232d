use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use crate::database::manager::{Database, DatabaseError};
use crate::database::models::{Donation, NewDonation};
use crate::database::service;

pub const MAX_DONOR_NAME_LEN: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum DonationError {
    #[error("Invalid donation fields")]
    Validation(HashMap<String, String>),
    #[error("Fund not found: {0}")]
    FundNotFound(i64),
    #[error("Donation not found: {0}")]
    NotFound(i64),
    #[error("Invalid donation id: {0}")]
    InvalidId(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Body of `POST /api/donations`. Fields stay loosely typed so each one can be
/// reported individually instead of failing the whole body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    #[serde(default)]
    pub fund_id: Option<Value>,
    #[serde(default)]
    pub donor_name: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
}

impl CreateDonationRequest {
    pub fn validate(&self) -> Result<NewDonation, DonationError> {
        let mut field_errors = HashMap::new();

        let fund_id = match present(&self.fund_id) {
            None => {
                field_errors.insert("fundId".to_string(), "This field is required".to_string());
                None
            }
            Some(v) => {
                let id = match v {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                match id {
                    Some(id) if id > 0 => Some(id),
                    _ => {
                        field_errors
                            .insert("fundId".to_string(), "Must be a positive integer".to_string());
                        None
                    }
                }
            }
        };

        let donor_name = match present(&self.donor_name) {
            None => {
                field_errors.insert("donorName".to_string(), "This field is required".to_string());
                None
            }
            Some(Value::String(s)) => {
                let name = s.trim();
                if name.is_empty() {
                    field_errors.insert("donorName".to_string(), "Must not be blank".to_string());
                    None
                } else if name.chars().count() > MAX_DONOR_NAME_LEN {
                    field_errors.insert(
                        "donorName".to_string(),
                        format!("Must be at most {} characters", MAX_DONOR_NAME_LEN),
                    );
                    None
                } else {
                    Some(name.to_string())
                }
            }
            Some(_) => {
                field_errors.insert("donorName".to_string(), "Must be a string".to_string());
                None
            }
        };

        let amount = match present(&self.amount) {
            None => {
                field_errors.insert("amount".to_string(), "This field is required".to_string());
                None
            }
            Some(v) => {
                let amount = match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                match amount {
                    Some(a) if a.is_finite() && a > 0.0 => Some(a),
                    _ => {
                        field_errors
                            .insert("amount".to_string(), "Must be a positive number".to_string());
                        None
                    }
                }
            }
        };

        match (fund_id, donor_name, amount) {
            (Some(fund_id), Some(donor_name), Some(amount)) if field_errors.is_empty() => {
                Ok(NewDonation { fund_id, donor_name, amount })
            }
            _ => Err(DonationError::Validation(field_errors)),
        }
    }
}

// JSON null counts as absent
fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

/// Path ids must be positive integers
pub fn parse_donation_id(raw: &str) -> Result<i64, DonationError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(DonationError::InvalidId(raw.to_string())),
    }
}

pub struct DonationService {
    db: Database,
}

impl DonationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validate and store a donation against an existing fund
    pub async fn create(&self, request: &CreateDonationRequest) -> Result<Donation, DonationError> {
        let new_donation = request.validate()?;

        if !service::fund_exists(&self.db, new_donation.fund_id).await? {
            return Err(DonationError::FundNotFound(new_donation.fund_id));
        }

        // The fund can vanish between the check and the insert
        let donation = service::insert_donation(&self.db, &new_donation)
            .await
            .map_err(|e| {
                if e.is_foreign_key_violation() {
                    DonationError::FundNotFound(new_donation.fund_id)
                } else {
                    DonationError::Database(e)
                }
            })?;

        info!(
            donation_id = donation.id,
            fund_id = donation.fund_id,
            amount = donation.amount,
            "Donation recorded"
        );
        Ok(donation)
    }

    /// Remove a donation permanently. Returns the deleted id.
    pub async fn delete(&self, raw_id: &str) -> Result<i64, DonationError> {
        let id = parse_donation_id(raw_id)?;

        if !service::delete_donation(&self.db, id).await? {
            return Err(DonationError::NotFound(id));
        }

        info!(donation_id = id, "Donation deleted");
        Ok(id)
    }
}
