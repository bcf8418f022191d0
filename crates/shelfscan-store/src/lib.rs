//! Product lookup and mutation on PostgreSQL.
//!
//! This crate provides:
//! - `DatabaseConfig`, read once from the environment
//! - The `ProductStore` trait used by the API layer
//! - `PgProductStore`, one pooled connection and one statement per call

pub mod config;
pub mod error;
pub mod products;

pub use config::{redact_url, ConfigError, DatabaseConfig};
pub use error::{StoreError, StoreResult};
pub use products::{PgProductStore, ProductStore};
