//! Product rows and seller commands.

use serde::{Deserialize, Serialize};

/// A row of the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    /// Matches a classifier label when the catalog is set up correctly.
    pub product_name: String,
    pub category: String,
    pub barcode: String,
    /// Price in whole currency units.
    pub price: i64,
}

/// Seller listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub product_name: String,
    pub price: i64,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            product_name: product.product_name.clone(),
            price: product.price,
        }
    }
}

/// Body of `PUT /seller/update-price`.
///
/// Only the JSON shape is checked. Negative prices and unknown ids pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub product_id: i64,
    pub new_price: i64,
}
