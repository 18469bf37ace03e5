//! Artifacts persisted by a stage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// An artifact written during a run.
///
/// The pipeline references artifacts by locator only; it never reads its own
/// output back within the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageArtifact {
    /// The type of artifact (e.g., "clean_problem_image").
    #[serde(rename = "type")]
    pub artifact_type: String,

    /// The identifier the artifact is addressed by.
    pub id: String,

    /// Where the artifact was written.
    pub path: PathBuf,

    /// The externally visible locator (URI or path).
    pub locator: String,

    /// Size of the written payload in bytes.
    pub byte_size: u64,

    /// Additional metadata about the artifact.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// When the artifact was created (ISO 8601).
    pub created_at: String,
}

impl StageArtifact {
    /// Creates a new artifact record.
    #[must_use]
    pub fn new(
        artifact_type: impl Into<String>,
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        locator: impl Into<String>,
        byte_size: u64,
    ) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            id: id.into(),
            path: path.into(),
            locator: locator.into(),
            byte_size,
            metadata: HashMap::new(),
            created_at: super::iso_timestamp(),
        }
    }

    /// Adds metadata to the artifact.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
