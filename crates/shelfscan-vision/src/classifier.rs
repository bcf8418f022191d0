//! Fashion classifier backed by an ONNX model.
//!
//! The model is an opaque `image -> 10 scores` function. It is loaded once
//! at startup and shared read-only for the life of the process:
//! - CUDA on Linux with NVIDIA GPU (when `cuda` feature enabled)
//! - CoreML on macOS
//! - CPU fallback on all platforms

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use metrics::histogram;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use shelfscan_models::{Classification, FashionLabel};

use crate::error::{VisionError, VisionResult};
use crate::preprocess::{invalid_var, PreparedImage};

/// How raw model outputs become probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputActivation {
    /// Outputs are already probabilities (softmax head in the graph).
    #[default]
    Identity,
    /// Outputs are logits.
    Softmax,
}

impl OutputActivation {
    pub fn from_str_lossy(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "identity" | "none" => Some(OutputActivation::Identity),
            "softmax" => Some(OutputActivation::Softmax),
            _ => None,
        }
    }

    fn apply(&self, scores: Vec<f32>) -> Vec<f32> {
        match self {
            OutputActivation::Identity => scores,
            OutputActivation::Softmax => softmax(&scores),
        }
    }
}

/// Classifier configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Path to ONNX model file
    pub model_path: String,
    /// Output tensor to read; first graph output when unset
    pub output_name: Option<String>,
    /// Post-processing of the output scores
    pub activation: OutputActivation,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: "models/fashion.onnx".to_string(),
            output_name: None,
            activation: OutputActivation::Identity,
        }
    }
}

impl ClassifierConfig {
    /// Create config from environment variables.
    ///
    /// An unrecognized `MODEL_OUTPUT_ACTIVATION` is an error.
    pub fn from_env() -> VisionResult<Self> {
        let activation = match std::env::var("MODEL_OUTPUT_ACTIVATION") {
            Ok(raw) => OutputActivation::from_str_lossy(&raw)
                .ok_or_else(|| invalid_var("MODEL_OUTPUT_ACTIVATION", &raw))?,
            Err(_) => OutputActivation::default(),
        };

        Ok(Self {
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "models/fashion.onnx".to_string()),
            output_name: std::env::var("MODEL_OUTPUT_NAME").ok().filter(|s| !s.is_empty()),
            activation,
        })
    }
}

/// Anything that can score a prepared image against the label vocabulary.
pub trait ImageClassifier: Send + Sync {
    /// One score per label, in `FashionLabel::ALL` order.
    fn scores(&self, input: &PreparedImage) -> VisionResult<Vec<f32>>;

    /// Classifier name for logging.
    fn name(&self) -> &'static str;

    /// Arg-max label and its score.
    fn classify(&self, input: &PreparedImage) -> VisionResult<Classification> {
        let scores = self.scores(input)?;
        top_class(&scores)
    }
}

/// Slack for probabilities that land just outside `[0, 1]` from float error.
const PROBABILITY_TOLERANCE: f32 = 1e-4;

/// Pick the highest-scoring label.
///
/// Ties go to the lowest index. The score vector must have exactly one
/// finite entry per label, each a probability in `[0, 1]`.
pub fn top_class(scores: &[f32]) -> VisionResult<Classification> {
    if scores.len() != FashionLabel::COUNT {
        return Err(VisionError::inference(format!(
            "expected {} class scores, got {}",
            FashionLabel::COUNT,
            scores.len()
        )));
    }
    if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
        return Err(VisionError::inference(format!(
            "non-finite score at index {}",
            bad
        )));
    }
    let range = -PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE;
    if let Some(bad) = scores.iter().position(|s| !range.contains(s)) {
        return Err(VisionError::inference(format!(
            "score {} at index {} is not a probability; check MODEL_OUTPUT_ACTIVATION",
            scores[bad], bad
        )));
    }

    let mut best_index = 0;
    let mut best_score = scores[0];
    for (i, &score) in scores.iter().enumerate().skip(1) {
        if score > best_score {
            best_score = score;
            best_index = i;
        }
    }

    let label = FashionLabel::from_index(best_index)
        .ok_or_else(|| VisionError::internal(format!("no label at index {}", best_index)))?;

    Ok(Classification::new(label, best_score.clamp(0.0, 1.0)))
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Classifier running an ONNX model through ONNX Runtime.
///
/// `Session::run` needs `&mut`, so calls are serialized through a mutex.
/// The weights themselves are never modified after load.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    output_name: String,
    config: ClassifierConfig,
}

impl OnnxClassifier {
    /// Load the model. Returns error if the file is missing or rejected.
    pub fn load(config: ClassifierConfig) -> VisionResult<Self> {
        let model_path = Path::new(&config.model_path);
        if !model_path.exists() {
            return Err(VisionError::model_not_found(&config.model_path));
        }

        let session = create_session(model_path)?;

        let output_name = match &config.output_name {
            Some(name) => name.clone(),
            None => session
                .outputs
                .first()
                .map(|o| o.name.clone())
                .ok_or_else(|| VisionError::model_load("model declares no outputs"))?,
        };

        info!(
            model_path = %config.model_path,
            output = %output_name,
            activation = ?config.activation,
            "Fashion classifier initialized"
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            config,
        })
    }

    fn run_inference(&self, input: Value) -> VisionResult<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::internal("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::inference(format!("ONNX inference failed: {}", e)))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| VisionError::inference(format!("Missing {} tensor", self.output_name)))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::inference(format!("Failed to extract tensor: {}", e)))?;

        Ok(data.to_vec())
    }
}

impl ImageClassifier for OnnxClassifier {
    fn scores(&self, input: &PreparedImage) -> VisionResult<Vec<f32>> {
        let tensor = Tensor::from_array((input.shape(), input.to_vec().into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| VisionError::internal(format!("Failed to create tensor: {}", e)))?;

        let start = Instant::now();
        let raw = self.run_inference(tensor)?;
        let elapsed = start.elapsed().as_secs_f64();
        histogram!("shelfscan_inference_duration_seconds").record(elapsed);
        debug!(duration_ms = elapsed * 1000.0, "Inference completed");

        Ok(self.config.activation.apply(raw))
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// Create ONNX Runtime session with automatic execution provider selection.
fn create_session(model_path: &Path) -> VisionResult<Session> {
    let model_bytes = std::fs::read(model_path)
        .map_err(|e| VisionError::model_load(format!("Failed to read model file: {}", e)))?;

    let builder = Session::builder()
        .map_err(|e| VisionError::model_load(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::model_load(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!("Using CUDA execution provider for classification");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, trying alternatives");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!("Using CoreML execution provider for classification");
                return Ok(session);
            }
        }
        debug!("CoreML execution provider not available, using CPU");
    }

    info!("Using CPU execution provider for classification");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| VisionError::model_load(format!("Failed to load ONNX model: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn one_hot(index: usize, peak: f32) -> Vec<f32> {
        let rest = (1.0 - peak) / (FashionLabel::COUNT as f32 - 1.0);
        (0..FashionLabel::COUNT)
            .map(|i| if i == index { peak } else { rest })
            .collect()
    }

    #[test]
    fn test_top_class_every_label() {
        for label in FashionLabel::ALL {
            let result = top_class(&one_hot(label.index(), 0.91)).unwrap();
            assert_eq!(result.label, label);
            assert!((result.confidence - 0.91).abs() < 1e-6);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn test_top_class_tie_picks_lowest_index() {
        let mut scores = vec![0.0; 10];
        scores[3] = 0.5;
        scores[7] = 0.5;
        assert_eq!(top_class(&scores).unwrap().label, FashionLabel::Dress);
    }

    #[test]
    fn test_top_class_rejects_bad_output() {
        assert!(matches!(top_class(&[0.5; 9]), Err(VisionError::Inference(_))));
        assert!(matches!(top_class(&[]), Err(VisionError::Inference(_))));

        let mut scores = vec![0.1; 10];
        scores[2] = f32::NAN;
        assert!(matches!(top_class(&scores), Err(VisionError::Inference(_))));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[2.0, 1.0, 0.1, -3.0, 1000.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(top_class(&probs).unwrap().label, FashionLabel::Pullover);
    }

    #[test]
    fn test_top_class_rejects_logits() {
        let logits = [2.5, -1.0, 0.3, 7.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert!(matches!(top_class(&logits), Err(VisionError::Inference(_))));
        assert_eq!(top_class(&softmax(&logits)).unwrap().label, FashionLabel::Dress);
    }

    #[test]
    #[serial]
    fn test_from_env_activation() {
        std::env::remove_var("MODEL_OUTPUT_ACTIVATION");
        assert_eq!(
            ClassifierConfig::from_env().unwrap().activation,
            OutputActivation::Identity
        );

        std::env::set_var("MODEL_OUTPUT_ACTIVATION", "softmax");
        assert_eq!(
            ClassifierConfig::from_env().unwrap().activation,
            OutputActivation::Softmax
        );

        std::env::set_var("MODEL_OUTPUT_ACTIVATION", "softmx");
        assert!(matches!(
            ClassifierConfig::from_env(),
            Err(VisionError::InvalidConfig(_))
        ));
        std::env::remove_var("MODEL_OUTPUT_ACTIVATION");
    }

    #[test]
    fn test_activation_parsing() {
        assert_eq!(OutputActivation::from_str_lossy("Softmax"), Some(OutputActivation::Softmax));
        assert_eq!(OutputActivation::from_str_lossy("none"), Some(OutputActivation::Identity));
        assert_eq!(OutputActivation::from_str_lossy("sigmoid"), None);
    }

    #[test]
    fn test_load_missing_model() {
        let config = ClassifierConfig {
            model_path: "/nonexistent/fashion.onnx".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            OnnxClassifier::load(config),
            Err(VisionError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_load_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"not a protobuf").unwrap();

        let config = ClassifierConfig {
            model_path: path.to_string_lossy().to_string(),
            ..Default::default()
        };
        assert!(matches!(
            OnnxClassifier::load(config),
            Err(VisionError::ModelLoad(_))
        ));
    }

    #[test]
    #[ignore = "requires ONNX model"]
    fn test_real_model_output_shape() {
        use crate::preprocess::{PreprocessConfig, Preprocessor};

        let classifier = OnnxClassifier::load(ClassifierConfig::from_env().unwrap()).unwrap();
        let pre = Preprocessor::new(PreprocessConfig::from_env().unwrap()).unwrap();
        let img = image::DynamicImage::new_rgb8(64, 64);
        let scores = classifier.scores(&pre.prepare_image(&img)).unwrap();
        assert_eq!(scores.len(), FashionLabel::COUNT);
    }
}
