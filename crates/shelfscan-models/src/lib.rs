//! Shared data models for the ShelfScan backend.
//!
//! This crate provides Serde-serializable types for:
//! - The fixed fashion label vocabulary
//! - Classification results
//! - Product rows and seller listings
//! - Price update commands

pub mod classification;
pub mod label;
pub mod product;

pub use classification::{round_confidence, Classification};
pub use label::{FashionLabel, LabelParseError};
pub use product::{PriceUpdate, Product, ProductSummary};
