pub mod aggregation;
pub mod donation_service;
pub mod fund_service;

pub use aggregation::{totals, FundTotals};
pub use donation_service::{CreateDonationRequest, DonationError, DonationService};
pub use fund_service::{FundError, FundOverview, FundService};
