//! Input validation and page normalization.

use super::{names, Stage};
use crate::context::{AnalysisContext, NormalizationFlags, PreprocessRecord};
use crate::core::{StageKind, StageStatus};
use crate::errors::AnalysisError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A normalized page and the corrections applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPage {
    /// The image later stages read.
    pub path: PathBuf,
    /// What was corrected.
    pub flags: NormalizationFlags,
}

/// Geometric normalization of a photographed page.
///
/// Rotation correction, margin trimming and resolution normalization plug in
/// here.
#[async_trait]
pub trait PageNormalizer: Send + Sync + Debug {
    /// Normalizes `source`, returning the location to read from.
    async fn normalize(&self, source: &Path) -> Result<NormalizedPage, AnalysisError>;
}

/// Leaves the page untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughNormalizer;

#[async_trait]
impl PageNormalizer for PassthroughNormalizer {
    async fn normalize(&self, source: &Path) -> Result<NormalizedPage, AnalysisError> {
        Ok(NormalizedPage {
            path: source.to_path_buf(),
            flags: NormalizationFlags::default(),
        })
    }
}

/// Validates the source image and records its basic properties.
///
/// Checks run in order: existence, size, extension. The first failing check
/// is raised.
#[derive(Debug, Clone)]
pub struct PreprocessStage {
    allowed_extensions: Vec<String>,
    normalizer: Arc<dyn PageNormalizer>,
}

impl Default for PreprocessStage {
    fn default() -> Self {
        Self::new(vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()])
    }
}

impl PreprocessStage {
    /// Creates the stage accepting the given extensions (without dot, any case).
    #[must_use]
    pub fn new(allowed_extensions: Vec<String>) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            normalizer: Arc::new(PassthroughNormalizer),
        }
    }

    /// Replaces the page normalizer.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Arc<dyn PageNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn is_allowed(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.allowed_extensions.iter().any(|e| *e == extension)
    }
}

#[async_trait]
impl Stage for PreprocessStage {
    fn name(&self) -> &str {
        names::PREPROCESS
    }

    fn kind(&self) -> StageKind {
        StageKind::Guard
    }

    async fn execute(&self, mut ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        let source = ctx.source_location().to_path_buf();

        let metadata = match tokio::fs::metadata(&source).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(AnalysisError::NotFound { path: source }),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AnalysisError::NotFound { path: source }),
            Err(e) => return Err(e.into()),
        };

        let byte_size = metadata.len();
        if byte_size == 0 {
            return Err(AnalysisError::EmptyInput { path: source });
        }

        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !self.is_allowed(&extension) {
            let shown = if extension.is_empty() { String::new() } else { format!(".{extension}") };
            return Err(AnalysisError::UnsupportedFormat { extension: shown });
        }

        let page = self.normalizer.normalize(&source).await?;

        // A header we cannot read is not fatal here; decoding stages decide.
        let dimensions = match image::image_dimensions(&page.path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                debug!(path = %page.path.display(), error = %e, "Could not read image header");
                None
            }
        };

        info!(
            subject_id = ctx.subject_id(),
            byte_size,
            format = %extension.to_lowercase(),
            "Validated source image"
        );

        let record = PreprocessRecord {
            original_path: source,
            processed_path: page.path,
            byte_size,
            format: format!(".{}", extension.to_lowercase()),
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            normalization: page.flags,
            status: StageStatus::Completed,
        };
        ctx.set_preprocessed(self.name(), record)?;
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{blank_page, write_png};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_valid_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "page.png", &blank_page(40, 30));

        let ctx = PreprocessStage::default()
            .execute(AnalysisContext::new("s1", &path))
            .await
            .unwrap();

        let record = ctx.preprocessed().unwrap();
        assert_eq!(record.format, ".png");
        assert_eq!(record.width, Some(40));
        assert_eq!(record.height, Some(30));
        assert_eq!(record.processed_path, path);
        assert_eq!(record.normalization, NormalizationFlags::default());
        assert!(record.byte_size > 0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = PreprocessStage::default()
            .execute(AnalysisContext::new("s1", "/nonexistent/page.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::NotFound { .. }));
        assert!(err.to_string().starts_with("File not found"));
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();

        let err = PreprocessStage::default()
            .execute(AnalysisContext::new("any-subject", &path))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput { .. }));
    }

    #[tokio::test]
    async fn test_txt_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"12 + 30 = 42").unwrap();

        let err = PreprocessStage::default()
            .execute(AnalysisContext::new("another-subject", &path))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unsupported file format: .txt");
        assert!(err.is_input_validation());
    }

    #[tokio::test]
    async fn test_uppercase_extension_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PAGE.PNG");
        blank_page(8, 8).save_with_format(&path, image::ImageFormat::Png).unwrap();

        let ctx = PreprocessStage::default()
            .execute(AnalysisContext::new("s1", &path))
            .await
            .unwrap();
        assert_eq!(ctx.preprocessed().unwrap().format, ".png");
    }

    #[tokio::test]
    async fn test_unreadable_header_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let ctx = PreprocessStage::default()
            .execute(AnalysisContext::new("s1", &path))
            .await
            .unwrap();
        let record = ctx.preprocessed().unwrap();
        assert_eq!(record.width, None);
        assert_eq!(record.format, ".jpg");
    }
}
