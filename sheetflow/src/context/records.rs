//! Per-stage result records stored in the context slots.

use crate::core::StageStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Geometric corrections applied to the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct NormalizationFlags {
    /// Skew or rotation was corrected.
    pub rotation_corrected: bool,
    /// Brightness was adjusted.
    pub brightness_adjusted: bool,
    /// Contrast was adjusted.
    pub contrast_adjusted: bool,
    /// Margins were trimmed.
    pub margins_removed: bool,
    /// The page was resampled to a standard resolution.
    pub resolution_normalized: bool,
}

/// Output of the preprocess stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessRecord {
    /// The validated input.
    pub original_path: PathBuf,
    /// The image later stages must read.
    pub processed_path: PathBuf,
    /// Size of the input in bytes.
    pub byte_size: u64,
    /// Lower-case, dot-prefixed extension such as `.png`.
    pub format: String,
    /// Present when the header could be read.
    pub width: Option<u32>,
    /// Present when the header could be read.
    pub height: Option<u32>,
    /// Corrections reported by the page normalizer.
    pub normalization: NormalizationFlags,
    /// Stage outcome.
    pub status: StageStatus,
}

/// Output of the print/hand separation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationRecord {
    /// Locator of the stored print layer, empty when unavailable.
    pub print_layer_locator: String,
    /// Where the print layer was written.
    pub print_layer_path: Option<PathBuf>,
    /// The processed input, which still carries the handwriting.
    pub hand_layer_path: PathBuf,
    /// The remover that ran.
    pub separation_method: String,
    /// Remover confidence, `0.0` for fallbacks and failures.
    pub confidence: f64,
    /// Stage outcome.
    pub status: StageStatus,
    /// Failure description, if any.
    pub error: Option<String>,
}

/// Output of the clean-problem stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedProblemRecord {
    /// Locator of the handwriting-free problem, empty when unavailable.
    pub clean_image_locator: String,
    /// Where the clean image lives.
    pub clean_image_path: Option<PathBuf>,
    /// True when a remover produced the image.
    pub handwriting_removed: bool,
    /// Stage outcome.
    pub status: StageStatus,
}

/// Output of the extract-problem stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProblemRecord {
    /// Identifier the problem image was stored under.
    pub problem_file_id: Option<String>,
    /// Where the problem image was written.
    pub problem_image_path: Option<PathBuf>,
    /// Empty when the image could not be produced.
    pub problem_image_locator: String,
    /// The remover that ran.
    pub separation_method: String,
    /// Remover confidence, `0.0` for fallbacks and failures.
    pub confidence: f64,
    /// True when a remover produced the image.
    pub handwriting_removed: bool,
    /// Stage outcome.
    pub status: StageStatus,
    /// Failure description, if any.
    pub error: Option<String>,
}

/// Pixel rectangle of an answer on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRegion {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Output of the extract-answer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAnswerRecord {
    /// Recognized answer, empty when unreadable or unreliable.
    pub answer_text: String,
    /// Final confidence in `[0, 1]`.
    pub confidence: f64,
    /// Confidence before the minimum-confidence rule.
    pub raw_confidence: f64,
    /// Engine that produced the reading.
    pub ocr_method: String,
    /// Not located yet; always `None`.
    pub answer_region: Option<AnswerRegion>,
    /// Stage outcome.
    pub status: StageStatus,
    /// Failure description, if any.
    pub error: Option<String>,
}

impl ExtractedAnswerRecord {
    /// A hard failure: empty text, zero confidence and the cause.
    #[must_use]
    pub fn failed(ocr_method: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            answer_text: String::new(),
            confidence: 0.0,
            raw_confidence: 0.0,
            ocr_method: ocr_method.into(),
            answer_region: None,
            status: StageStatus::Failed,
            error: Some(error.into()),
        }
    }
}

/// Output of the postprocess stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostprocessRecord {
    /// The assembled result.
    pub result: super::AnalysisResult,
    /// Stage outcome.
    pub status: StageStatus,
}
