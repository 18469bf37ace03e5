//! Handwritten answer recognition.

use super::{names, Stage};
use crate::context::{AnalysisContext, ExtractedAnswerRecord};
use crate::core::{StageKind, StageStatus};
use crate::errors::AnalysisError;
use crate::imaging::{preprocess_for_ocr, OcrPrepParams};
use crate::ocr::{read_answer, ConfidencePolicy, OcrEngine, OcrRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Reads the answer from the processed page.
///
/// Decode and engine failures never leave this stage: they are recorded as a
/// failed reading with zero confidence.
#[derive(Clone)]
pub struct ExtractAnswerStage {
    engine: Arc<dyn OcrEngine>,
    request: OcrRequest,
    prep: OcrPrepParams,
    policy: ConfidencePolicy,
}

impl std::fmt::Debug for ExtractAnswerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractAnswerStage")
            .field("engine", &self.engine.name())
            .field("request", &self.request)
            .field("prep", &self.prep)
            .field("policy", &self.policy)
            .finish()
    }
}

impl ExtractAnswerStage {
    /// Creates the stage with default request, preparation and policy.
    #[must_use]
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            request: OcrRequest::default(),
            prep: OcrPrepParams::default(),
            policy: ConfidencePolicy::default(),
        }
    }

    /// Sets the recognition request.
    #[must_use]
    pub fn with_request(mut self, request: OcrRequest) -> Self {
        self.request = request;
        self
    }

    /// Sets the image preparation parameters.
    #[must_use]
    pub const fn with_prep(mut self, prep: OcrPrepParams) -> Self {
        self.prep = prep;
        self
    }

    /// Sets the confidence policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ConfidencePolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn read(&self, ctx: &AnalysisContext) -> Result<ExtractedAnswerRecord, AnalysisError> {
        let method = self.engine.name().to_string();
        let path = ctx.processed_location().to_path_buf();
        let prep = self.prep;

        let prepared = tokio::task::spawn_blocking(move || image::open(&path).map(|img| preprocess_for_ocr(&img, &prep)))
            .await
            .map_err(|e| AnalysisError::stage(self.name(), e.to_string()))?;

        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(subject_id = ctx.subject_id(), error = %e, "Could not decode image for OCR");
                return Ok(ExtractedAnswerRecord::failed(method, e.to_string()));
            }
        };

        match read_answer(self.engine.as_ref(), &prepared, &self.request, &self.policy).await {
            Ok(reading) => {
                info!(
                    subject_id = ctx.subject_id(),
                    confidence = reading.confidence,
                    raw_confidence = reading.raw_confidence,
                    discarded = reading.discarded,
                    "Read answer"
                );
                Ok(ExtractedAnswerRecord {
                    answer_text: reading.text,
                    confidence: reading.confidence,
                    raw_confidence: reading.raw_confidence,
                    ocr_method: method,
                    answer_region: None,
                    status: StageStatus::Completed,
                    error: None,
                })
            }
            Err(e) => {
                warn!(subject_id = ctx.subject_id(), error = %e, "OCR engine failed");
                Ok(ExtractedAnswerRecord::failed(method, e.to_string()))
            }
        }
    }
}

#[async_trait]
impl Stage for ExtractAnswerStage {
    fn name(&self) -> &str {
        names::EXTRACT_ANSWER
    }

    fn kind(&self) -> StageKind {
        StageKind::Enrich
    }

    async fn execute(&self, mut ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        let record = self.read(&ctx).await?;
        ctx.set_extracted_answer(self.name(), record)?;
        Ok(ctx)
    }
}
