pub mod auth;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;
pub mod state;
