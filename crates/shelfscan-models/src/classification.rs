//! Classification results.

use serde::{Deserialize, Serialize};

use crate::label::FashionLabel;

/// Outcome of classifying one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Arg-max label
    pub label: FashionLabel,
    /// Score of the arg-max label, in [0, 1]
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: FashionLabel, confidence: f32) -> Self {
        Self { label, confidence }
    }

    /// Confidence rounded for responses.
    pub fn rounded_confidence(&self) -> f64 {
        round_confidence(self.confidence)
    }
}

/// Round a confidence to 4 decimal places.
///
/// Done in f64 so the serialized value has no f32 widening noise
/// (0.9876 stays 0.9876, not 0.98760002).
pub fn round_confidence(confidence: f32) -> f64 {
    (f64::from(confidence) * 10_000.0).round() / 10_000.0
}
