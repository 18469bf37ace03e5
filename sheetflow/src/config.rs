//! Analyzer configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Files ending in `.json` are read as JSON, everything else as
//! TOML.

use crate::errors::AnalysisError;
use crate::imaging::{ClaheParams, OcrPrepParams};
use crate::ocr::{ConfidencePolicy, OcrRequest, SegmentationMode, DEFAULT_WHITELIST};
use crate::pipeline::PipelineLayout;
use crate::removal::{RemoverKind, ThresholdParams};
use crate::storage::Addressing;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Which stage chain to build.
    pub layout: PipelineLayout,
    /// Input validation.
    pub preprocess: PreprocessConfig,
    /// Handwriting removal.
    pub removal: RemovalConfig,
    /// Answer recognition.
    pub ocr: OcrConfig,
    /// Artifact storage.
    pub storage: StorageConfig,
}

/// Input validation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Accepted extensions, without the dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

/// Handwriting removal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalConfig {
    /// Strategy to construct.
    #[serde(default)]
    pub kind: RemoverKind,
    /// Adaptive threshold window, odd and at least 3.
    #[serde(default = "default_block_size")]
    pub block_size: u32,
    /// Subtracted from the local mean.
    #[serde(default = "default_bias")]
    pub bias: i32,
    /// Opening element size, odd and at least 1.
    #[serde(default = "default_kernel_size")]
    pub kernel_size: u32,
    /// Weights for the model remover.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            kind: RemoverKind::default(),
            block_size: default_block_size(),
            bias: default_bias(),
            kernel_size: default_kernel_size(),
            model_path: None,
        }
    }
}

impl RemovalConfig {
    /// Threshold parameters shared by every remover.
    #[must_use]
    pub const fn threshold_params(&self) -> ThresholdParams {
        ThresholdParams {
            block_size: self.block_size,
            bias: self.bias,
            kernel_size: self.kernel_size,
        }
    }
}

const fn default_block_size() -> u32 {
    11
}

const fn default_bias() -> i32 {
    2
}

const fn default_kernel_size() -> u32 {
    3
}

/// Answer recognition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Readings below this are discarded.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Confidence given to plain-text readings.
    #[serde(default = "default_text_only_confidence")]
    pub text_only_confidence: f64,
    /// Confidence reported for discarded readings.
    #[serde(default = "default_unreliable_confidence")]
    pub unreliable_confidence: f64,
    /// Characters the engine may emit.
    #[serde(default = "default_whitelist")]
    pub whitelist: String,
    /// The tesseract executable.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Traineddata language.
    #[serde(default = "default_language")]
    pub language: String,
    /// Adaptive threshold window for OCR preparation.
    #[serde(default = "default_block_size")]
    pub block_size: u32,
    /// Adaptive threshold bias for OCR preparation.
    #[serde(default = "default_bias")]
    pub bias: i32,
    /// CLAHE clip limit.
    #[serde(default = "default_clahe_clip_limit")]
    pub clahe_clip_limit: f64,
    /// CLAHE tiles per axis.
    #[serde(default = "default_clahe_tiles")]
    pub clahe_tiles: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            text_only_confidence: default_text_only_confidence(),
            unreliable_confidence: default_unreliable_confidence(),
            whitelist: default_whitelist(),
            binary: default_binary(),
            language: default_language(),
            block_size: default_block_size(),
            bias: default_bias(),
            clahe_clip_limit: default_clahe_clip_limit(),
            clahe_tiles: default_clahe_tiles(),
        }
    }
}

impl OcrConfig {
    /// The confidence policy.
    #[must_use]
    pub const fn policy(&self) -> ConfidencePolicy {
        ConfidencePolicy {
            min_confidence: self.min_confidence,
            text_only_confidence: self.text_only_confidence,
            unreliable_confidence: self.unreliable_confidence,
        }
    }

    /// The recognition request.
    #[must_use]
    pub fn request(&self) -> OcrRequest {
        OcrRequest {
            whitelist: self.whitelist.clone(),
            mode: SegmentationMode::SingleBlock,
        }
    }

    /// Image preparation parameters.
    #[must_use]
    pub const fn prep(&self) -> OcrPrepParams {
        OcrPrepParams {
            block_size: self.block_size,
            bias: self.bias,
            clahe: ClaheParams {
                clip_limit: self.clahe_clip_limit,
                tiles: self.clahe_tiles,
            },
        }
    }
}

const fn default_min_confidence() -> f64 {
    0.3
}

const fn default_text_only_confidence() -> f64 {
    0.5
}

const fn default_unreliable_confidence() -> f64 {
    0.2
}

fn default_whitelist() -> String {
    DEFAULT_WHITELIST.to_string()
}

fn default_binary() -> PathBuf {
    PathBuf::from("tesseract")
}

fn default_language() -> String {
    "eng".to_string()
}

const fn default_clahe_clip_limit() -> f64 {
    2.0
}

const fn default_clahe_tiles() -> u32 {
    8
}

/// Artifact storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory artifacts are written under.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Prefix of public locators.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// Naming scheme.
    #[serde(default)]
    pub addressing: Addressing,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            url_prefix: default_url_prefix(),
            addressing: Addressing::default(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_url_prefix() -> String {
    "/files".to_string()
}

impl AnalyzerConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Config` if the file cannot be read, parsed or
    /// validated.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Config(format!("cannot read {}: {e}", path.display())))?;

        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&raw).map_err(|e| AnalysisError::Config(e.to_string()))?
        } else {
            toml::from_str(&raw).map_err(|e| AnalysisError::Config(e.to_string()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Config` naming the first invalid field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        check_window("removal.block_size", self.removal.block_size, 3)?;
        check_window("removal.kernel_size", self.removal.kernel_size, 1)?;
        check_window("ocr.block_size", self.ocr.block_size, 3)?;

        for (field, value) in [
            ("ocr.min_confidence", self.ocr.min_confidence),
            ("ocr.text_only_confidence", self.ocr.text_only_confidence),
            ("ocr.unreliable_confidence", self.ocr.unreliable_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::Config(format!("{field} must be within [0, 1], got {value}")));
            }
        }
        if self.ocr.unreliable_confidence <= 0.0 {
            return Err(AnalysisError::Config(
                "ocr.unreliable_confidence must be above 0.0, which marks hard failures".to_string(),
            ));
        }
        if self.ocr.whitelist.is_empty() {
            return Err(AnalysisError::Config("ocr.whitelist must not be empty".to_string()));
        }
        if self.ocr.clahe_tiles == 0 {
            return Err(AnalysisError::Config("ocr.clahe_tiles must be at least 1".to_string()));
        }
        if self.preprocess.allowed_extensions.is_empty() {
            return Err(AnalysisError::Config(
                "preprocess.allowed_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_window(field: &str, value: u32, min: u32) -> Result<(), AnalysisError> {
    if value < min || value % 2 == 0 {
        return Err(AnalysisError::Config(format!(
            "{field} must be odd and at least {min}, got {value}"
        )));
    }
    Ok(())
}
