//! coinshop Library
//!
//! Re-exports modules for integration testing and the binaries.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod identity;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{AccountId, Coins, DomainError, OperationContext, UserSummary};
pub use error::{AppError, AppResult, ErrorResponse};
