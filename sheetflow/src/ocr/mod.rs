//! Answer recognition on top of an external OCR engine.
//!
//! The engine is a collaborator: it receives a preprocessed page plus a
//! character whitelist and returns tokens with confidences, or plain text.
//! [`read_answer`] layers the confidence aggregation on top of it.

mod confidence;
mod tesseract;

pub use confidence::{aggregate_tokens, AnswerReading, ConfidencePolicy, ReadingSource};
pub use tesseract::{parse_tsv, TesseractEngine};

use async_trait::async_trait;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Digits and the arithmetic operators that can appear in an answer.
pub const DEFAULT_WHITELIST: &str = "0123456789+-×÷=()[]";

/// Errors from an OCR engine.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine could not be started.
    #[error("OCR engine '{engine}' is unavailable: {message}")]
    Unavailable {
        /// Engine name.
        engine: String,
        /// Why it could not be started.
        message: String,
    },

    /// The engine ran but reported a failure.
    #[error("OCR engine '{engine}' failed: {message}")]
    Engine {
        /// Engine name.
        engine: String,
        /// The engine's own error output.
        message: String,
    },

    /// The image could not be handed to the engine.
    #[error("OCR input error: {0}")]
    Input(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for OcrError {
    fn from(err: image::ImageError) -> Self {
        Self::Input(err.to_string())
    }
}

/// How the engine should segment the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Treat the image as one uniform block of text.
    #[default]
    SingleBlock,
    /// Treat the image as a single text line.
    SingleLine,
}

impl SegmentationMode {
    /// The tesseract page segmentation number.
    #[must_use]
    pub const fn psm(self) -> u8 {
        match self {
            Self::SingleBlock => 6,
            Self::SingleLine => 7,
        }
    }
}

/// Parameters of a recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    /// Characters the engine may emit.
    pub whitelist: String,
    /// Page segmentation.
    pub mode: SegmentationMode,
}

impl Default for OcrRequest {
    fn default() -> Self {
        Self {
            whitelist: DEFAULT_WHITELIST.to_string(),
            mode: SegmentationMode::SingleBlock,
        }
    }
}

/// One recognized token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    /// Token text, possibly empty.
    pub text: String,
    /// Engine confidence on a 0 to 100 scale; negative when unknown.
    pub confidence: f64,
}

impl OcrToken {
    /// Creates a token.
    #[must_use]
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// A text recognition engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine identifier recorded as the OCR method.
    fn name(&self) -> &str;

    /// Recognizes tokens with per-token confidence.
    async fn recognize_tokens(&self, image: &GrayImage, request: &OcrRequest) -> Result<Vec<OcrToken>, OcrError>;

    /// Recognizes plain text without confidence data.
    async fn recognize_text(&self, image: &GrayImage, request: &OcrRequest) -> Result<String, OcrError>;
}

/// Reads an answer from a prepared image.
///
/// Runs token recognition first. When no token carries a confidence, a
/// single plain-text pass is made. The policy then decides whether the
/// reading is reliable enough to keep.
///
/// # Errors
///
/// Returns the engine error if either recognition call fails.
pub async fn read_answer(
    engine: &dyn OcrEngine,
    image: &GrayImage,
    request: &OcrRequest,
    policy: &ConfidencePolicy,
) -> Result<AnswerReading, OcrError> {
    let tokens = engine.recognize_tokens(image, request).await?;
    let (text, average) = aggregate_tokens(&tokens);

    if average > 0.0 {
        return Ok(policy.judge(text, average, ReadingSource::Tokens));
    }

    let plain = engine.recognize_text(image, request).await?;
    let plain = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    if plain.is_empty() {
        Ok(policy.judge(String::new(), 0.0, ReadingSource::None))
    } else {
        Ok(policy.judge(plain, policy.text_only_confidence, ReadingSource::TextOnly))
    }
}
