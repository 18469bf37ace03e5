//! Lifecycle events emitted while a pipeline runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An event emitted by the executor during a run.
///
/// Events are consumed by event sinks for logging, monitoring, or test
/// assertions. Every event carries the subject it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    /// The event type (e.g., "stage.started", "stage.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl StageEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: super::iso_timestamp(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Gets a data field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Creates a "pipeline.started" event.
    #[must_use]
    pub fn pipeline_started(pipeline: &str, subject_id: &str, stage_count: usize) -> Self {
        Self::new("pipeline.started")
            .add_data("pipeline", serde_json::json!(pipeline))
            .add_data("subject_id", serde_json::json!(subject_id))
            .add_data("stage_count", serde_json::json!(stage_count))
    }

    /// Creates a "pipeline.completed" event.
    #[must_use]
    pub fn pipeline_completed(pipeline: &str, subject_id: &str, duration_ms: f64) -> Self {
        Self::new("pipeline.completed")
            .add_data("pipeline", serde_json::json!(pipeline))
            .add_data("subject_id", serde_json::json!(subject_id))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.started" event.
    #[must_use]
    pub fn started(stage_name: &str, subject_id: &str) -> Self {
        Self::new("stage.started")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("subject_id", serde_json::json!(subject_id))
    }

    /// Creates a "stage.completed" event.
    #[must_use]
    pub fn completed(stage_name: &str, subject_id: &str, duration_ms: f64) -> Self {
        Self::new("stage.completed")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("subject_id", serde_json::json!(subject_id))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "stage.failed" event.
    #[must_use]
    pub fn failed(stage_name: &str, subject_id: &str, error: &str, error_kind: &str) -> Self {
        Self::new("stage.failed")
            .add_data("stage", serde_json::json!(stage_name))
            .add_data("subject_id", serde_json::json!(subject_id))
            .add_data("error", serde_json::json!(error))
            .add_data("error_kind", serde_json::json!(error_kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = StageEvent::new("test.event");
        assert_eq!(event.event_type, "test.event");
        assert!(event.data.is_empty());
    }

    #[test]
    fn test_event_started() {
        let event = StageEvent::started("preprocess", "subject-1");
        assert_eq!(event.event_type, "stage.started");
        assert_eq!(event.get("stage"), Some(&serde_json::json!("preprocess")));
        assert_eq!(event.get("subject_id"), Some(&serde_json::json!("subject-1")));
    }

    #[test]
    fn test_event_completed() {
        let event = StageEvent::completed("preprocess", "subject-1", 12.5);
        assert_eq!(event.event_type, "stage.completed");
        assert_eq!(event.get("duration_ms"), Some(&serde_json::json!(12.5)));
    }

    #[test]
    fn test_event_failed() {
        let event = StageEvent::failed("preprocess", "subject-1", "File is empty", "empty_input");
        assert_eq!(event.get("error"), Some(&serde_json::json!("File is empty")));
        assert_eq!(event.get("error_kind"), Some(&serde_json::json!("empty_input")));
    }

    #[test]
    fn test_event_serialization_uses_type_key() {
        let event = StageEvent::new("pipeline.started");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "pipeline.started");
    }
}
