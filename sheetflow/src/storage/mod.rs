//! Persistence of derived images.
//!
//! Artifacts are written once and referenced by locator afterwards. The
//! pipeline never reads them back within a run.

use crate::core::StageArtifact;
use crate::errors::AnalysisError;
use async_trait::async_trait;
use chrono::Utc;
use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// How stored artifacts are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// A fresh random identifier per artifact.
    #[default]
    Identifier,
    /// The SHA-256 of the encoded bytes.
    Content,
}

/// Destination for derived images.
#[async_trait]
pub trait ArtifactStore: Send + Sync + std::fmt::Debug {
    /// Encodes `image` as PNG and stores it under a new identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    async fn put_png(&self, artifact_type: &str, image: &GrayImage) -> Result<StageArtifact, AnalysisError>;
}

/// Writes artifacts under `<root>/<YYYY-MM-DD>/<id>.png`.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
    url_prefix: String,
    addressing: Addressing,
}

impl LocalArtifactStore {
    /// Creates a store rooted at `root` whose locators start with `url_prefix`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
            addressing: Addressing::default(),
        }
    }

    /// Sets the naming scheme.
    #[must_use]
    pub const fn with_addressing(mut self, addressing: Addressing) -> Self {
        self.addressing = addressing;
        self
    }

    /// Returns the storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds the public locator for an identifier.
    #[must_use]
    pub fn locator(&self, id: &str) -> String {
        format!("{}/{id}", self.url_prefix.trim_end_matches('/'))
    }

    fn identify(&self, bytes: &[u8]) -> String {
        match self.addressing {
            Addressing::Identifier => Uuid::new_v4().to_string(),
            Addressing::Content => hex::encode(Sha256::digest(bytes)),
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put_png(&self, artifact_type: &str, image: &GrayImage) -> Result<StageArtifact, AnalysisError> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

        let id = self.identify(&bytes);
        let dir = self.root.join(Utc::now().format("%Y-%m-%d").to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{id}.png"));
        tokio::fs::write(&path, &bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Stored artifact");

        let locator = self.locator(&id);
        Ok(StageArtifact::new(artifact_type, id, path, locator, bytes.len() as u64)
            .with_metadata("width", serde_json::json!(image.width()))
            .with_metadata("height", serde_json::json!(image.height())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[tokio::test]
    async fn test_identifier_addressing_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "/files");

        let artifact = store
            .put_png("problem_image", &GrayImage::from_pixel(8, 8, Luma([255])))
            .await
            .unwrap();

        assert!(artifact.path.exists());
        assert!(artifact.path.starts_with(dir.path()));
        assert_eq!(artifact.locator, format!("/files/{}", artifact.id));
        assert!(Uuid::parse_str(&artifact.id).is_ok());
        assert!(artifact.byte_size > 0);
    }

    #[tokio::test]
    async fn test_content_addressing_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "/files/").with_addressing(Addressing::Content);
        let image = GrayImage::from_pixel(8, 8, Luma([0]));

        let first = store.put_png("print_layer", &image).await.unwrap();
        let second = store.put_png("print_layer", &image).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.id.len(), 64);
        assert_eq!(first.locator, format!("/files/{}", first.id));
    }

    #[test]
    fn test_locator_trims_trailing_slash() {
        let store = LocalArtifactStore::new("uploads", "/files/");
        assert_eq!(store.locator("abc"), "/files/abc");
    }
}
