pub mod account;
pub mod donation;
pub mod fund;

pub use account::Account;
pub use donation::{Donation, NewDonation};
pub use fund::{Fund, FUND_COLUMNS};
