//! Confidence aggregation for recognized answers.

use super::OcrToken;
use serde::{Deserialize, Serialize};

/// Where the text of a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    /// Token recognition with confidences.
    Tokens,
    /// Plain-text recognition, confidence assigned by policy.
    TextOnly,
    /// Neither pass produced text.
    None,
}

/// Thresholds applied to a raw reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePolicy {
    /// Readings below this are discarded.
    pub min_confidence: f64,
    /// Assigned to plain-text readings, which carry no confidence.
    pub text_only_confidence: f64,
    /// Reported for discarded readings. Must stay above `0.0`, which marks
    /// hard failures.
    pub unreliable_confidence: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            text_only_confidence: 0.5,
            unreliable_confidence: 0.2,
        }
    }
}

impl ConfidencePolicy {
    /// Applies the minimum-confidence rule to a raw reading.
    #[must_use]
    pub fn judge(&self, text: String, raw_confidence: f64, source: ReadingSource) -> AnswerReading {
        let raw_confidence = raw_confidence.clamp(0.0, 1.0);
        if raw_confidence < self.min_confidence {
            return AnswerReading {
                text: String::new(),
                confidence: self.unreliable_confidence,
                raw_confidence,
                source,
                discarded: true,
            };
        }

        AnswerReading {
            text,
            confidence: raw_confidence,
            raw_confidence,
            source,
            discarded: false,
        }
    }
}

/// A judged answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerReading {
    /// The answer, empty when discarded.
    pub text: String,
    /// Final confidence in `[0, 1]`.
    pub confidence: f64,
    /// Confidence before the minimum rule.
    pub raw_confidence: f64,
    /// Which pass produced the text.
    pub source: ReadingSource,
    /// True when the text fell below the minimum.
    pub discarded: bool,
}

/// Joins non-empty tokens and averages their positive confidences.
///
/// Returns the joined text and the average scaled to `[0, 1]`, or `0.0` when
/// no token has a positive confidence.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_tokens(tokens: &[OcrToken]) -> (String, f64) {
    let words: Vec<&OcrToken> = tokens.iter().filter(|t| !t.text.trim().is_empty()).collect();

    let text = words.iter().map(|t| t.text.trim()).collect::<Vec<_>>().join(" ");

    let scored: Vec<f64> = words.iter().map(|t| t.confidence).filter(|c| *c > 0.0).collect();
    if scored.is_empty() {
        return (text, 0.0);
    }
    let average = scored.iter().sum::<f64>() / scored.len() as f64 / 100.0;
    (text, average.clamp(0.0, 1.0))
}
