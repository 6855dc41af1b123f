//! Shared ids, errors, and configuration for Ledgerbook.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for clients and transactions
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, GatewayConfig, ServerConfig};
pub use error::AppError;
pub use types::{ClientId, TransactionId};
