//! Stages that remove handwriting and persist the printed problem.

use super::{names, Stage};
use crate::context::{AnalysisContext, CleanedProblemRecord, ExtractedProblemRecord, SeparationRecord};
use crate::core::{StageArtifact, StageKind, StageStatus};
use crate::errors::AnalysisError;
use crate::removal::{HandwritingRemover, RemovalOutcome};
use crate::storage::ArtifactStore;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Decodes `path` off the async runtime and runs the remover on it.
///
/// The outer error is a runtime failure; the inner one a decode failure.
async fn decode_and_remove(
    remover: &Arc<dyn HandwritingRemover>,
    path: &Path,
) -> Result<Result<RemovalOutcome, image::ImageError>, AnalysisError> {
    let remover = Arc::clone(remover);
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || image::open(&path).map(|img| remover.apply(&img)))
        .await
        .map_err(|e| AnalysisError::stage("removal", e.to_string()))
}

/// Runs removal and stores the result.
///
/// Returns the outcome and artifact, or the decode error description.
async fn remove_and_store(
    stage: &str,
    remover: &Arc<dyn HandwritingRemover>,
    store: &Arc<dyn ArtifactStore>,
    artifact_type: &str,
    path: &Path,
) -> Result<Result<(RemovalOutcome, StageArtifact), String>, AnalysisError> {
    let outcome = match decode_and_remove(remover, path).await? {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(stage, path = %path.display(), error = %e, "Could not decode image for removal");
            return Ok(Err(e.to_string()));
        }
    };

    let artifact = store
        .put_png(artifact_type, &outcome.image)
        .await
        .map_err(|e| AnalysisError::stage(stage, e.to_string()))?;
    Ok(Ok((outcome, artifact)))
}

/// Removes handwriting and stores the printed problem in one step.
#[derive(Debug, Clone)]
pub struct ExtractProblemStage {
    remover: Arc<dyn HandwritingRemover>,
    store: Arc<dyn ArtifactStore>,
}

impl ExtractProblemStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(remover: Arc<dyn HandwritingRemover>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { remover, store }
    }
}

#[async_trait]
impl Stage for ExtractProblemStage {
    fn name(&self) -> &str {
        names::EXTRACT_PROBLEM
    }

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    async fn execute(&self, mut ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        let source = ctx.processed_location().to_path_buf();
        let result = remove_and_store(self.name(), &self.remover, &self.store, "problem_image", &source).await?;

        let record = match result {
            Ok((outcome, artifact)) => {
                info!(
                    subject_id = ctx.subject_id(),
                    method = %outcome.method_name,
                    confidence = outcome.confidence,
                    locator = %artifact.locator,
                    "Extracted problem image"
                );
                ExtractedProblemRecord {
                    problem_file_id: Some(artifact.id),
                    problem_image_path: Some(artifact.path),
                    problem_image_locator: artifact.locator,
                    separation_method: outcome.method_name,
                    confidence: outcome.confidence,
                    handwriting_removed: true,
                    status: StageStatus::Completed,
                    error: None,
                }
            }
            Err(error) => ExtractedProblemRecord {
                problem_file_id: None,
                problem_image_path: None,
                problem_image_locator: String::new(),
                separation_method: self.remover.method_name().to_string(),
                confidence: 0.0,
                handwriting_removed: false,
                status: StageStatus::Failed,
                error: Some(error),
            },
        };

        ctx.set_extracted_problem(self.name(), record)?;
        Ok(ctx)
    }
}

/// Splits the page into a stored print layer and the handwriting-bearing input.
#[derive(Debug, Clone)]
pub struct SeparatePrintHandStage {
    remover: Arc<dyn HandwritingRemover>,
    store: Arc<dyn ArtifactStore>,
}

impl SeparatePrintHandStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(remover: Arc<dyn HandwritingRemover>, store: Arc<dyn ArtifactStore>) -> Self {
        Self { remover, store }
    }
}

#[async_trait]
impl Stage for SeparatePrintHandStage {
    fn name(&self) -> &str {
        names::SEPARATE_PRINT_HAND
    }

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    async fn execute(&self, mut ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        let source = ctx.processed_location().to_path_buf();
        let result = remove_and_store(self.name(), &self.remover, &self.store, "print_layer", &source).await?;

        let record = match result {
            Ok((outcome, artifact)) => {
                info!(
                    subject_id = ctx.subject_id(),
                    method = %outcome.method_name,
                    confidence = outcome.confidence,
                    "Separated print layer"
                );
                SeparationRecord {
                    print_layer_locator: artifact.locator,
                    print_layer_path: Some(artifact.path),
                    hand_layer_path: source,
                    separation_method: outcome.method_name,
                    confidence: outcome.confidence,
                    status: StageStatus::Completed,
                    error: None,
                }
            }
            Err(error) => SeparationRecord {
                print_layer_locator: String::new(),
                print_layer_path: None,
                hand_layer_path: source,
                separation_method: self.remover.method_name().to_string(),
                confidence: 0.0,
                status: StageStatus::Failed,
                error: Some(error),
            },
        };

        ctx.set_separated_layers(self.name(), record)?;
        Ok(ctx)
    }
}

/// Publishes the print layer as the clean problem image.
///
/// Only references the stored layer; nothing is re-read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanProblemStage;

impl CleanProblemStage {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for CleanProblemStage {
    fn name(&self) -> &str {
        names::CLEAN_PROBLEM
    }

    async fn execute(&self, mut ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        let record = match ctx.separated_layers() {
            Some(layers) if layers.status.is_success() => CleanedProblemRecord {
                clean_image_locator: layers.print_layer_locator.clone(),
                clean_image_path: layers.print_layer_path.clone(),
                handwriting_removed: true,
                status: StageStatus::Completed,
            },
            Some(_) => CleanedProblemRecord {
                clean_image_locator: String::new(),
                clean_image_path: None,
                handwriting_removed: false,
                status: StageStatus::Failed,
            },
            None => CleanedProblemRecord {
                clean_image_locator: String::new(),
                clean_image_path: None,
                handwriting_removed: false,
                status: StageStatus::Completed,
            },
        };

        ctx.set_cleaned_problem(self.name(), record)?;
        Ok(ctx)
    }
}
