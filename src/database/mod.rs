pub mod manager;
pub mod migrations;
pub mod models;
pub mod seed;
pub mod service;

pub use manager::{Backend, Database, DatabaseError};
pub use models::{Account, Donation, Fund, NewDonation};
