//! Photo classification and product lookup.

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use shelfscan_models::{FashionLabel, Product};
use shelfscan_vision::VisionError;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

pub const PRODUCT_NOT_FOUND: &str = "Product not found in database";

/// Product details attached to a prediction.
#[derive(Debug, Serialize)]
pub struct ProductDetails {
    pub name: String,
    pub category: String,
    pub barcode: String,
    pub price: i64,
}

impl From<Product> for ProductDetails {
    fn from(product: Product) -> Self {
        Self {
            name: product.product_name,
            category: product.category,
            barcode: product.barcode,
            price: product.price,
        }
    }
}

/// Exactly one of `product` and `message` is present.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_class: FashionLabel,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Classify an uploaded photo and look up the matching product.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let multipart = multipart?;
    let image = read_file_field(multipart).await?;

    let recognizer = state.recognizer.clone();
    let classification = tokio::task::spawn_blocking(move || recognizer.recognize(&image))
        .await
        .map_err(|e| VisionError::inference(format!("Inference task failed: {}", e)))??;

    let label = classification.label;
    let confidence = classification.rounded_confidence();
    metrics::record_prediction(label.as_str());

    let product = state.products.find_by_name(label.as_str()).await?;
    metrics::record_product_lookup(product.is_some());

    info!(
        label = %label,
        confidence,
        found = product.is_some(),
        "Prediction served"
    );

    let response = match product {
        Some(product) => PredictResponse {
            predicted_class: label,
            confidence,
            product: Some(product.into()),
            message: None,
        },
        None => PredictResponse {
            predicted_class: label,
            confidence,
            product: None,
            message: Some(PRODUCT_NOT_FOUND.to_string()),
        },
    };

    Ok(Json(response))
}

/// Bytes of the first `file` field. Other fields are skipped.
async fn read_file_field(mut multipart: Multipart) -> ApiResult<Bytes> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }

    warn!("Upload without a file field");
    Err(ApiError::validation(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}
