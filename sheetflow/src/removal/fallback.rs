//! Removers that are declared but not yet implemented.
//!
//! Both delegate to [`ThresholdRemover`] and report
//! [`FALLBACK_CONFIDENCE`](super::FALLBACK_CONFIDENCE).

use super::{HandwritingRemover, ThresholdParams, ThresholdRemover, FALLBACK_CONFIDENCE};
use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stroke-shape based separation.
#[derive(Debug, Clone, Default)]
pub struct MorphologyRemover {
    fallback: ThresholdRemover,
}

impl MorphologyRemover {
    /// Creates the remover; `params` configure the fallback.
    #[must_use]
    pub const fn new(params: ThresholdParams) -> Self {
        Self {
            fallback: ThresholdRemover::new(params),
        }
    }
}

impl HandwritingRemover for MorphologyRemover {
    fn remove(&self, image: &DynamicImage) -> GrayImage {
        debug!(remover = self.method_name(), "Falling back to threshold removal");
        self.fallback.remove(image)
    }

    fn method_name(&self) -> &str {
        "morphology_based"
    }

    fn confidence(&self) -> f64 {
        FALLBACK_CONFIDENCE
    }
}

/// Learned segmentation model.
///
/// The model file is recorded but never loaded yet.
#[derive(Debug, Clone, Default)]
pub struct ModelRemover {
    model_path: Option<PathBuf>,
    fallback: ThresholdRemover,
}

impl ModelRemover {
    /// Creates the remover; `params` configure the fallback.
    #[must_use]
    pub const fn new(model_path: Option<PathBuf>, params: ThresholdParams) -> Self {
        Self {
            model_path,
            fallback: ThresholdRemover::new(params),
        }
    }

    /// Returns the configured model location, if any.
    #[must_use]
    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }
}

impl HandwritingRemover for ModelRemover {
    fn remove(&self, image: &DynamicImage) -> GrayImage {
        debug!(
            remover = self.method_name(),
            model = ?self.model_path,
            "Model not available, falling back to threshold removal"
        );
        self.fallback.remove(image)
    }

    fn method_name(&self) -> &str {
        "ai_based"
    }

    fn confidence(&self) -> f64 {
        FALLBACK_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path_is_recorded() {
        let remover = ModelRemover::new(Some(PathBuf::from("weights/unet.onnx")), ThresholdParams::default());
        assert_eq!(remover.model_path(), Some(Path::new("weights/unet.onnx")));
        assert!(ModelRemover::default().model_path().is_none());
    }

    #[test]
    fn test_fallback_confidence_is_zero() {
        assert!(MorphologyRemover::default().confidence().abs() < f64::EPSILON);
        assert!(ModelRemover::default().confidence().abs() < f64::EPSILON);
    }
}
