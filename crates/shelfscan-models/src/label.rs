//! Fashion label vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Categories the classifier can predict.
///
/// Variant order is the model's output order: index `i` of the score vector
/// belongs to `FashionLabel::ALL[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FashionLabel {
    /// Spelled the way the product table keys it.
    #[serde(rename = "Angle boot")]
    AngleBoot,
    #[serde(rename = "Bag")]
    Bag,
    #[serde(rename = "Coat")]
    Coat,
    #[serde(rename = "Dress")]
    Dress,
    #[serde(rename = "Pullover")]
    Pullover,
    #[serde(rename = "Sandal")]
    Sandal,
    #[serde(rename = "Shirt")]
    Shirt,
    #[serde(rename = "Sneaker")]
    Sneaker,
    #[serde(rename = "T-shirt")]
    TShirt,
    #[serde(rename = "Trouser")]
    Trouser,
}

impl FashionLabel {
    /// All labels in model output order.
    pub const ALL: [FashionLabel; 10] = [
        FashionLabel::AngleBoot,
        FashionLabel::Bag,
        FashionLabel::Coat,
        FashionLabel::Dress,
        FashionLabel::Pullover,
        FashionLabel::Sandal,
        FashionLabel::Shirt,
        FashionLabel::Sneaker,
        FashionLabel::TShirt,
        FashionLabel::Trouser,
    ];

    /// Number of classes the model must emit.
    pub const COUNT: usize = Self::ALL.len();

    /// Label for a model output index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this label in the model output.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Name used in responses and as the product lookup key.
    pub fn as_str(&self) -> &'static str {
        match self {
            FashionLabel::AngleBoot => "Angle boot",
            FashionLabel::Bag => "Bag",
            FashionLabel::Coat => "Coat",
            FashionLabel::Dress => "Dress",
            FashionLabel::Pullover => "Pullover",
            FashionLabel::Sandal => "Sandal",
            FashionLabel::Shirt => "Shirt",
            FashionLabel::Sneaker => "Sneaker",
            FashionLabel::TShirt => "T-shirt",
            FashionLabel::Trouser => "Trouser",
        }
    }
}

impl fmt::Display for FashionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FashionLabel {
    type Err = LabelParseError;

    /// Exact match only; "bag" is not "Bag".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|label| label.as_str() == s)
            .copied()
            .ok_or_else(|| LabelParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown fashion label: {0}")]
pub struct LabelParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_order() {
        let names: Vec<&str> = FashionLabel::ALL.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Angle boot", "Bag", "Coat", "Dress", "Pullover",
                "Sandal", "Shirt", "Sneaker", "T-shirt", "Trouser",
            ]
        );
        assert_eq!(FashionLabel::COUNT, 10);
    }

    #[test]
    fn test_index_round_trip() {
        for (i, label) in FashionLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(FashionLabel::from_index(i), Some(*label));
        }
        assert_eq!(FashionLabel::from_index(10), None);
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&FashionLabel::TShirt).unwrap();
        assert_eq!(json, "\"T-shirt\"");

        let parsed: FashionLabel = serde_json::from_str("\"Angle boot\"").unwrap();
        assert_eq!(parsed, FashionLabel::AngleBoot);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!("Bag".parse::<FashionLabel>().unwrap(), FashionLabel::Bag);
        assert!("bag".parse::<FashionLabel>().is_err());
        assert!("Ankle boot".parse::<FashionLabel>().is_err());
    }
}
