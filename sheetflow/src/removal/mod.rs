//! Handwriting removal strategies.
//!
//! A remover turns a photographed page into a grayscale rendering that keeps
//! printed strokes and drops pencil marks. Three maturity levels exist and one
//! is chosen when a stage is constructed:
//!
//! - [`ThresholdRemover`]: local adaptive binarization plus morphological
//!   opening. Fully implemented.
//! - [`MorphologyRemover`] and [`ModelRemover`]: reserved extension points.
//!   Until they grow a real algorithm they produce exactly the threshold
//!   output and report confidence `0.0`, so consumers can tell that no real
//!   separation happened without knowing which remover ran.

mod fallback;
mod threshold;

pub use fallback::{ModelRemover, MorphologyRemover};
pub use threshold::{ThresholdParams, ThresholdRemover};

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

/// Confidence reported by a remover that did not perform real separation.
pub const FALLBACK_CONFIDENCE: f64 = 0.0;

/// Capability shared by all handwriting removers.
///
/// Implementations must be pure: the same pixels and parameters always give
/// the same output, with the same dimensions as the input.
pub trait HandwritingRemover: Send + Sync + Debug {
    /// Removes handwriting, returning a single-channel image.
    fn remove(&self, image: &DynamicImage) -> GrayImage;

    /// Stable identifier of the strategy.
    fn method_name(&self) -> &str;

    /// Self-reported quality estimate in `[0, 1]`.
    fn confidence(&self) -> f64;

    /// Runs [`remove`](Self::remove) and packages the result.
    fn apply(&self, image: &DynamicImage) -> RemovalOutcome {
        RemovalOutcome {
            image: self.remove(image),
            method_name: self.method_name().to_string(),
            confidence: self.confidence(),
        }
    }
}

/// Output of a removal strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalOutcome {
    /// The cleaned page, dark ink on white.
    pub image: GrayImage,
    /// Which strategy produced it.
    pub method_name: String,
    /// Quality estimate, `0.0` when the strategy fell back.
    pub confidence: f64,
}

impl RemovalOutcome {
    /// Returns true when the strategy reported that it fell back.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.confidence <= FALLBACK_CONFIDENCE
    }
}

/// Selects the removal strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoverKind {
    /// Adaptive threshold and opening.
    #[default]
    Threshold,
    /// Stroke-shape analysis (not yet implemented).
    Morphology,
    /// Learned segmentation model (not yet implemented).
    Model,
}

impl std::fmt::Display for RemoverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Threshold => "threshold",
            Self::Morphology => "morphology",
            Self::Model => "model",
        };
        write!(f, "{s}")
    }
}

/// Builds the remover for `kind`.
///
/// The fallback variants share `params` with their threshold delegate so their
/// output matches a plain threshold remover built with the same parameters.
#[must_use]
pub fn build_remover(
    kind: RemoverKind,
    params: ThresholdParams,
    model_path: Option<PathBuf>,
) -> Arc<dyn HandwritingRemover> {
    match kind {
        RemoverKind::Threshold => Arc::new(ThresholdRemover::new(params)),
        RemoverKind::Morphology => Arc::new(MorphologyRemover::new(params)),
        RemoverKind::Model => Arc::new(ModelRemover::new(model_path, params)),
    }
}

/// Removes handwriting with the threshold strategy.
#[must_use]
pub fn remove_handwriting(image: &DynamicImage, params: &ThresholdParams) -> GrayImage {
    ThresholdRemover::new(*params).remove(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn worksheet() -> DynamicImage {
        let mut rgb = RgbImage::from_pixel(60, 40, Rgb([245, 245, 245]));
        for x in 5..55 {
            for y in 10..13 {
                rgb.put_pixel(x, y, Rgb([15, 15, 15]));
            }
        }
        rgb.put_pixel(30, 30, Rgb([120, 120, 120]));
        DynamicImage::ImageRgb8(rgb)
    }

    #[test]
    fn test_build_remover_selects_variant() {
        let params = ThresholdParams::default();

        assert_eq!(
            build_remover(RemoverKind::Threshold, params, None).method_name(),
            "grayscale_adaptive_threshold"
        );
        assert_eq!(
            build_remover(RemoverKind::Morphology, params, None).method_name(),
            "morphology_based"
        );
        assert_eq!(build_remover(RemoverKind::Model, params, None).method_name(), "ai_based");
    }

    #[test]
    fn test_fallbacks_match_threshold_output() {
        let page = worksheet();
        let params = ThresholdParams::default();
        let expected = ThresholdRemover::new(params).remove(&page);

        for kind in [RemoverKind::Morphology, RemoverKind::Model] {
            let remover = build_remover(kind, params, Some(PathBuf::from("model.onnx")));
            let outcome = remover.apply(&page);

            assert_eq!(outcome.image, expected, "{kind} output differs");
            assert!(outcome.confidence.abs() < f64::EPSILON);
            assert!(outcome.is_fallback());
        }
    }

    #[test]
    fn test_apply_packages_threshold_outcome() {
        let outcome = ThresholdRemover::default().apply(&worksheet());

        assert_eq!(outcome.method_name, "grayscale_adaptive_threshold");
        assert!((outcome.confidence - 0.7).abs() < f64::EPSILON);
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.image.dimensions(), (60, 40));
    }

    #[test]
    fn test_remove_handwriting_helper() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 10, Luma([255])));
        let cleaned = remove_handwriting(&page, &ThresholdParams::default());

        assert!(cleaned.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_remover_kind_serde() {
        let kind: RemoverKind = serde_json::from_str("\"morphology\"").unwrap();
        assert_eq!(kind, RemoverKind::Morphology);
        assert_eq!(serde_json::to_string(&RemoverKind::Model).unwrap(), "\"model\"");
    }
}
