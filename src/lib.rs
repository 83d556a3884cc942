pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod services;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use error::ApiError;
pub use services::Propman;
