//! Externally visible result shapes.

use super::AnalysisContext;
use crate::errors::AnalysisError;
use serde::{Deserialize, Serialize};

/// Recognized answer with its confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Answer text, empty when nothing usable was read.
    pub text: String,
    /// Confidence in `[0, 1]`. `0.0` is a real value, not a missing one.
    pub confidence: f64,
}

/// The stable result of one analysis.
///
/// Every field is always present. Missing upstream data shows up as an empty
/// string or `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Handwriting-free problem image, empty when unavailable.
    pub clean_problem_image_locator: String,
    /// The answer reading.
    pub answer: AnswerResult,
}

impl AnalysisResult {
    /// Creates a result.
    #[must_use]
    pub fn new(locator: impl Into<String>, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            clean_problem_image_locator: locator.into(),
            answer: AnswerResult {
                text: text.into(),
                confidence,
            },
        }
    }
}

/// What `analyze` returns: the result plus the full working record.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// The analyzed subject.
    pub subject_id: String,
    /// The stable result.
    pub analysis: AnalysisResult,
    /// The final context, for debugging and persistence.
    pub context: AnalysisContext,
}

impl PipelineResult {
    /// Wraps a finished context, falling back to an empty result when the
    /// postprocess slot was never filled.
    #[must_use]
    pub fn from_context(context: AnalysisContext) -> Self {
        let analysis = context
            .postprocessed()
            .map(|record| record.result.clone())
            .unwrap_or_default();
        Self {
            subject_id: context.subject_id().to_string(),
            analysis,
            context,
        }
    }

    /// Renders the stable result, or the whole envelope when `full` is set,
    /// as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Serialization` if a value cannot be encoded.
    pub fn to_json(&self, full: bool) -> Result<String, AnalysisError> {
        let rendered = if full {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string_pretty(&self.analysis)?
        };
        Ok(rendered)
    }
}

/// How the problem image came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalSignal {
    /// A real remover separated the layers.
    Separated,
    /// A declared-but-unimplemented remover fell back to thresholding.
    Fallback,
    /// Removal was attempted and failed.
    Failed,
    /// No removal stage ran.
    Unavailable,
}

/// How trustworthy the answer is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSignal {
    /// Text was read with enough confidence.
    Read,
    /// Recognition ran but produced nothing usable; ask for manual entry.
    Unreliable,
    /// Recognition could not run (decode or engine failure) or never ran.
    Unreadable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_result_shape_is_stable() {
        let value = serde_json::to_value(AnalysisResult::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "clean_problem_image_locator": "",
                "answer": {"text": "", "confidence": 0.0}
            })
        );
    }

    #[test]
    fn test_pipeline_result_fallback() {
        let context = AnalysisContext::new("subject-1", "page.png");
        let result = PipelineResult::from_context(context);

        assert_eq!(result.subject_id, "subject-1");
        assert_eq!(result.analysis, AnalysisResult::default());
    }

    #[test]
    fn test_to_json_short_and_full() {
        let result = PipelineResult::from_context(AnalysisContext::new("subject-2", "page.png"));

        let short: serde_json::Value = serde_json::from_str(&result.to_json(false).unwrap()).unwrap();
        assert_eq!(short, serde_json::to_value(AnalysisResult::default()).unwrap());

        let full: serde_json::Value = serde_json::from_str(&result.to_json(true).unwrap()).unwrap();
        assert_eq!(full["subject_id"], json!("subject-2"));
        assert_eq!(full["analysis"], short);
        assert!(full.get("context").is_some());
    }
}
