//! Error types for the sheetflow analysis pipeline.
//!
//! The taxonomy separates input-validation failures, which surface verbatim
//! to the caller, from generic stage failures that carry the originating
//! message. Decode problems during answer extraction never reach this type:
//! the extract-answer stage records them as a failed reading instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sheetflow operations.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The source image does not exist.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// The missing location.
        path: PathBuf,
    },

    /// The source image has zero bytes.
    #[error("File is empty: {}", path.display())]
    EmptyInput {
        /// The empty location.
        path: PathBuf,
    },

    /// The source image container is not in the raster whitelist.
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The rejected extension, as written on the file.
        extension: String,
    },

    /// A stage failed for a reason other than input validation.
    #[error("Stage '{stage}' failed: {message}")]
    StageExecution {
        /// The stage that failed.
        stage: String,
        /// The originating error message.
        message: String,
    },

    /// A stage attempted to overwrite a populated context slot.
    #[error("{0}")]
    SlotConflict(#[from] SlotConflictError),

    /// A pipeline could not be assembled.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image decoding, encoding or processing failed.
    #[error("Image error: {0}")]
    Image(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Creates a generic stage failure.
    #[must_use]
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageExecution {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Returns true for missing, empty and unsupported inputs.
    ///
    /// These are raised synchronously by the preprocess stage and are never
    /// worth retrying.
    #[must_use]
    pub fn is_input_validation(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::EmptyInput { .. } | Self::UnsupportedFormat { .. }
        )
    }

    /// Short machine-readable kind, used in lifecycle events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::EmptyInput { .. } => "empty_input",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::StageExecution { .. } => "stage_execution",
            Self::SlotConflict(_) => "slot_conflict",
            Self::Validation(_) => "validation",
            Self::Config(_) => "config",
            Self::Image(_) => "image",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        if let Self::StageExecution { stage, .. } = self {
            map.insert("stage".to_string(), serde_json::json!(stage));
        }
        map
    }
}

impl From<image::ImageError> for AnalysisError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when a stage writes to a slot that is already populated.
#[derive(Debug, Clone, Error)]
#[error("Slot conflict: '{slot}' was already populated before stage '{stage}' ran")]
pub struct SlotConflictError {
    /// The slot name.
    pub slot: String,
    /// The stage attempting the write.
    pub stage: String,
}

impl SlotConflictError {
    /// Creates a new slot conflict error.
    #[must_use]
    pub fn new(slot: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            stage: stage.into(),
        }
    }
}

/// Error raised when writing an attribute key that already exists.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Attribute conflict: key '{key}' already exists")]
pub struct AttributeConflictError {
    /// The conflicting key.
    pub key: String,
}

impl AttributeConflictError {
    /// Creates a new attribute conflict error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl From<AttributeConflictError> for AnalysisError {
    fn from(err: AttributeConflictError) -> Self {
        Self::stage("attributes", err.to_string())
    }
}

/// Error raised when pipeline construction fails.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_validation_kinds() {
        let missing = AnalysisError::NotFound {
            path: PathBuf::from("/tmp/missing.png"),
        };
        let empty = AnalysisError::EmptyInput {
            path: PathBuf::from("/tmp/empty.png"),
        };
        let unsupported = AnalysisError::UnsupportedFormat {
            extension: ".txt".to_string(),
        };

        assert!(missing.is_input_validation());
        assert!(empty.is_input_validation());
        assert!(unsupported.is_input_validation());
        assert!(!AnalysisError::stage("extract_problem", "disk full").is_input_validation());
    }

    #[test]
    fn test_error_messages() {
        let empty = AnalysisError::EmptyInput {
            path: PathBuf::from("empty.png"),
        };
        assert_eq!(empty.to_string(), "File is empty: empty.png");

        let unsupported = AnalysisError::UnsupportedFormat {
            extension: ".txt".to_string(),
        };
        assert_eq!(unsupported.to_string(), "Unsupported file format: .txt");
    }

    #[test]
    fn test_stage_error_to_dict() {
        let err = AnalysisError::stage("extract_problem", "disk full");
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "stage_execution");
        assert_eq!(dict.get("stage").unwrap(), "extract_problem");
        assert!(dict.get("message").unwrap().as_str().unwrap().contains("disk full"));
    }

    #[test]
    fn test_slot_conflict_message() {
        let err = SlotConflictError::new("preprocessed", "preprocess");
        assert!(err.to_string().contains("preprocessed"));
        assert!(err.to_string().contains("preprocess"));
    }

    #[test]
    fn test_validation_error_with_stages() {
        let err = PipelineValidationError::new("Duplicate stage")
            .with_stages(vec!["preprocess".to_string()]);
        assert_eq!(err.stages, vec!["preprocess".to_string()]);
        assert_eq!(err.to_string(), "Duplicate stage");
    }
}
