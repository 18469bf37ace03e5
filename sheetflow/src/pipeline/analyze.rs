//! The worksheet analysis pipeline.

use super::{Pipeline, PipelineBuilder};
use crate::config::AnalyzerConfig;
use crate::context::{AnalysisContext, PipelineResult};
use crate::errors::AnalysisError;
use crate::events::{EventSink, NoOpEventSink};
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::removal::build_remover;
use crate::stages::{
    CleanProblemStage, ExtractAnswerStage, ExtractProblemStage, PostprocessStage, PreprocessStage,
    SeparatePrintHandStage, Stage,
};
use crate::storage::{ArtifactStore, LocalArtifactStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Which stage chain to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineLayout {
    /// Preprocess, extract-problem, extract-answer, postprocess.
    #[default]
    Standard,
    /// Preprocess, separate-print-hand, clean-problem, extract-answer,
    /// postprocess.
    Layered,
}

/// Runs the full analysis for one subject at a time.
///
/// Holds only immutable configuration; concurrent `analyze` calls each get
/// their own context.
#[derive(Debug, Clone)]
pub struct AnalyzePipeline {
    pipeline: Pipeline,
    layout: PipelineLayout,
}

impl AnalyzePipeline {
    /// Builds the pipeline with the tesseract engine and local storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AnalysisError> {
        let engine = Arc::new(TesseractEngine::new(&config.ocr.binary, &config.ocr.language));
        let store = Arc::new(
            LocalArtifactStore::new(&config.storage.root, &config.storage.url_prefix)
                .with_addressing(config.storage.addressing),
        );
        Self::with_components(config, engine, store, Arc::new(NoOpEventSink))
    }

    /// Builds the pipeline around the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_components(
        config: &AnalyzerConfig,
        engine: Arc<dyn OcrEngine>,
        store: Arc<dyn ArtifactStore>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;

        let remover = build_remover(
            config.removal.kind,
            config.removal.threshold_params(),
            config.removal.model_path.clone(),
        );
        let answer = ExtractAnswerStage::new(engine)
            .with_request(config.ocr.request())
            .with_prep(config.ocr.prep())
            .with_policy(config.ocr.policy());

        let mut stages: Vec<Arc<dyn Stage>> =
            vec![Arc::new(PreprocessStage::new(config.preprocess.allowed_extensions.clone()))];
        match config.layout {
            PipelineLayout::Standard => {
                stages.push(Arc::new(ExtractProblemStage::new(remover, store)));
            }
            PipelineLayout::Layered => {
                stages.push(Arc::new(SeparatePrintHandStage::new(remover, store)));
                stages.push(Arc::new(CleanProblemStage::new()));
            }
        }
        stages.push(Arc::new(answer));
        stages.push(Arc::new(PostprocessStage::new()));

        let mut builder = PipelineBuilder::new("analyze").with_event_sink(sink);
        for stage in stages {
            builder = builder.stage(stage)?;
        }

        Ok(Self {
            pipeline: builder.build()?,
            layout: config.layout,
        })
    }

    /// Returns the underlying pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the layout the pipeline was built with.
    #[must_use]
    pub const fn layout(&self) -> PipelineLayout {
        self.layout
    }

    /// Analyzes one worksheet image.
    ///
    /// # Errors
    ///
    /// Missing, empty and unsupported inputs are returned verbatim. Any other
    /// stage failure is returned as `AnalysisError::StageExecution` carrying
    /// the original message.
    pub async fn analyze(
        &self,
        subject_id: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Result<PipelineResult, AnalysisError> {
        let ctx = AnalysisContext::new(subject_id, source);
        let ctx = self
            .pipeline
            .run_reporting(ctx)
            .await
            .map_err(super::StageFailure::into_analysis_error)?;
        Ok(PipelineResult::from_context(ctx))
    }
}
