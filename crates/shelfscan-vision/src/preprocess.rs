//! Image preprocessing for the classifier.
//!
//! Turns uploaded bytes into the tensor the model was trained on:
//! - Decode any format the `image` crate recognizes
//! - Force 3-channel RGB (alpha is dropped, not composited)
//! - Resize exactly to the model input size
//! - Scale bytes [0, 255] to floats [0, 1]

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// Memory layout of the input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, H, W, 3]`, as exported from Keras
    #[default]
    Nhwc,
    /// `[1, 3, H, W]`, as exported from PyTorch
    Nchw,
}

impl TensorLayout {
    pub fn from_str_lossy(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nhwc" => Some(TensorLayout::Nhwc),
            "nchw" => Some(TensorLayout::Nchw),
            _ => None,
        }
    }
}

/// Preprocessing configuration.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Divide pixel values by 255
    pub normalize: bool,
    /// Tensor layout the model expects
    pub layout: TensorLayout,
    /// Resampling filter used for the resize
    pub filter: FilterType,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            normalize: true,
            layout: TensorLayout::Nhwc,
            filter: FilterType::CatmullRom,
        }
    }
}

impl PreprocessConfig {
    /// Create config from environment variables.
    ///
    /// Unset variables take the defaults; values that do not parse are
    /// rejected rather than silently replaced.
    pub fn from_env() -> VisionResult<Self> {
        let size = match std::env::var("MODEL_INPUT_SIZE") {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid_var("MODEL_INPUT_SIZE", &raw)),
            },
            Err(_) => 128,
        };

        let normalize = match std::env::var("MODEL_NORMALIZE") {
            Ok(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(invalid_var("MODEL_NORMALIZE", &raw)),
            },
            Err(_) => true,
        };

        let layout = match std::env::var("MODEL_LAYOUT") {
            Ok(raw) => TensorLayout::from_str_lossy(&raw)
                .ok_or_else(|| invalid_var("MODEL_LAYOUT", &raw))?,
            Err(_) => TensorLayout::default(),
        };

        Ok(Self {
            width: size,
            height: size,
            normalize,
            layout,
            filter: FilterType::CatmullRom,
        })
    }
}

pub(crate) fn invalid_var(name: &str, value: &str) -> VisionError {
    VisionError::InvalidConfig(format!("{} has invalid value {:?}", name, value))
}

/// A decoded, resized, scaled image ready for inference (batch of one).
#[derive(Debug, Clone)]
pub struct PreparedImage {
    tensor: Array4<f32>,
    layout: TensorLayout,
}

impl PreparedImage {
    pub fn tensor(&self) -> &Array4<f32> {
        &self.tensor
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    /// Tensor shape as ONNX Runtime wants it.
    pub fn shape(&self) -> Vec<usize> {
        self.tensor.shape().to_vec()
    }

    /// Flat tensor data in row-major order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.tensor.iter().copied().collect()
    }

    /// Mean over all values. Cheap summary used by tests and debug logs.
    pub fn mean(&self) -> f32 {
        self.tensor.mean().unwrap_or(0.0)
    }
}

/// Stateless image preprocessor.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> VisionResult<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(VisionError::InvalidConfig(format!(
                "input size must be non-zero, got {}x{}",
                config.width, config.height
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Decode raw image bytes and build the model input.
    pub fn prepare(&self, bytes: &[u8]) -> VisionResult<PreparedImage> {
        if bytes.is_empty() {
            return Err(VisionError::decode("empty image payload"));
        }

        let img = image::load_from_memory(bytes).map_err(|e| VisionError::decode(e.to_string()))?;

        debug!(
            width = img.width(),
            height = img.height(),
            bytes = bytes.len(),
            "Decoded upload"
        );

        Ok(self.prepare_image(&img))
    }

    /// Build the model input from an already decoded image.
    pub fn prepare_image(&self, img: &DynamicImage) -> PreparedImage {
        let (width, height) = (self.config.width, self.config.height);
        let rgb = img.to_rgb8();
        let resized = image::imageops::resize(&rgb, width, height, self.config.filter);

        let normalize = self.config.normalize;
        let scale = move |v: u8| {
            if normalize {
                v as f32 / 255.0
            } else {
                v as f32
            }
        };

        let (w, h) = (width as usize, height as usize);
        let tensor = match self.config.layout {
            TensorLayout::Nhwc => Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
                scale(resized.get_pixel(x as u32, y as u32)[c])
            }),
            TensorLayout::Nchw => Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
                scale(resized.get_pixel(x as u32, y as u32)[c])
            }),
        };

        PreparedImage {
            tensor,
            layout: self.config.layout,
        }
    }
}
