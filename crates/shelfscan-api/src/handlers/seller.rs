//! Seller catalog handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use shelfscan_models::{PriceUpdate, ProductSummary};

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

pub const PRICE_UPDATED: &str = "Price updated successfully";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// All products ordered by name.
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductSummary>>> {
    let products = state.products.list_all().await?;
    Ok(Json(products))
}

/// Set a product's price.
///
/// Reports success even when `product_id` matches nothing.
pub async fn update_price(
    State(state): State<AppState>,
    Json(update): Json<PriceUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    let rows = state
        .products
        .update_price(update.product_id, update.new_price)
        .await?;

    metrics::record_price_update(rows > 0);
    if rows == 0 {
        warn!(product_id = update.product_id, "Price update matched no product");
    }

    Ok(Json(MessageResponse {
        message: PRICE_UPDATED.to_string(),
    }))
}
