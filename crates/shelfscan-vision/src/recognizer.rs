//! Upload-to-label pipeline.

use std::sync::Arc;

use tracing::debug;

use shelfscan_models::Classification;

use crate::classifier::ImageClassifier;
use crate::error::VisionResult;
use crate::preprocess::Preprocessor;

/// Decodes an upload and classifies it.
///
/// Cheap to clone; the classifier is shared.
#[derive(Clone)]
pub struct Recognizer {
    preprocessor: Preprocessor,
    classifier: Arc<dyn ImageClassifier>,
}

impl Recognizer {
    pub fn new(preprocessor: Preprocessor, classifier: Arc<dyn ImageClassifier>) -> Self {
        Self {
            preprocessor,
            classifier,
        }
    }

    /// Classify raw image bytes. Blocking; run it off the async runtime.
    pub fn recognize(&self, image_bytes: &[u8]) -> VisionResult<Classification> {
        let prepared = self.preprocessor.prepare(image_bytes)?;
        let result = self.classifier.classify(&prepared)?;

        debug!(
            classifier = self.classifier.name(),
            label = %result.label,
            confidence = result.confidence,
            "Image classified"
        );

        Ok(result)
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;
    use crate::preprocess::tests::solid_png;
    use crate::preprocess::{PreparedImage, PreprocessConfig};
    use shelfscan_models::FashionLabel;

    /// Scores each label by how close the image brightness is to the
    /// label's slot on a 0..1 ramp. Brightness `i / 9` maximizes label `i`.
    struct BrightnessClassifier;

    impl ImageClassifier for BrightnessClassifier {
        fn scores(&self, input: &PreparedImage) -> VisionResult<Vec<f32>> {
            let brightness = input.mean();
            let raw: Vec<f32> = (0..FashionLabel::COUNT)
                .map(|i| {
                    let slot = i as f32 / (FashionLabel::COUNT - 1) as f32;
                    (-(brightness - slot).powi(2) * 200.0).exp()
                })
                .collect();
            let sum: f32 = raw.iter().sum();
            Ok(raw.into_iter().map(|r| r / sum).collect())
        }

        fn name(&self) -> &'static str {
            "brightness"
        }
    }

    struct BrokenClassifier;

    impl ImageClassifier for BrokenClassifier {
        fn scores(&self, _input: &PreparedImage) -> VisionResult<Vec<f32>> {
            Err(VisionError::inference("session exploded"))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn recognizer(classifier: Arc<dyn ImageClassifier>) -> Recognizer {
        let config = PreprocessConfig {
            width: 32,
            height: 32,
            ..Default::default()
        };
        Recognizer::new(Preprocessor::new(config).unwrap(), classifier)
    }

    #[test]
    fn test_synthetic_image_per_label() {
        let recognizer = recognizer(Arc::new(BrightnessClassifier));

        for label in FashionLabel::ALL {
            let level = (label.index() as f32 / 9.0 * 255.0).round() as u8;
            let png = solid_png(20, 20, [level, level, level]);

            let result = recognizer.recognize(&png).unwrap();
            assert_eq!(result.label, label, "level {} misclassified", level);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn test_decode_error_short_circuits() {
        let recognizer = recognizer(Arc::new(BrokenClassifier));
        assert!(matches!(
            recognizer.recognize(b"GIF89a-but-not-really"),
            Err(VisionError::Decode(_))
        ));
    }

    #[test]
    fn test_inference_error_propagates() {
        let recognizer = recognizer(Arc::new(BrokenClassifier));
        let png = solid_png(8, 8, [0, 0, 0]);
        assert!(matches!(
            recognizer.recognize(&png),
            Err(VisionError::Inference(_))
        ));
        assert_eq!(recognizer.classifier_name(), "broken");
    }
}
