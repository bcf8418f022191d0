//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /predict`: classify an uploaded photo and look up the product
//! - Seller endpoints for listing products and updating prices
//! - Health/readiness probes and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
