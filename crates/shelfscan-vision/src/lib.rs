//! Image preprocessing and fashion classification.
//!
//! This crate provides:
//! - Decoding and normalizing uploaded product photos
//! - An ONNX Runtime classifier over the fixed ten-label vocabulary
//! - A `Recognizer` that chains both for the predict endpoint

pub mod classifier;
pub mod error;
pub mod preprocess;
pub mod recognizer;

pub use classifier::{
    top_class, ClassifierConfig, ImageClassifier, OnnxClassifier, OutputActivation,
};
pub use error::{VisionError, VisionResult};
pub use preprocess::{PreparedImage, PreprocessConfig, Preprocessor, TensorLayout};
pub use recognizer::Recognizer;
