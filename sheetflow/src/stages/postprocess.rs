//! Result assembly.

use super::{names, Stage};
use crate::context::{AnalysisContext, AnalysisResult, PostprocessRecord};
use crate::core::StageStatus;
use crate::errors::AnalysisError;
use async_trait::async_trait;
use tracing::debug;

/// Builds the stable [`AnalysisResult`] from whatever slots are filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostprocessStage;

impl PostprocessStage {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for PostprocessStage {
    fn name(&self) -> &str {
        names::POSTPROCESS
    }

    async fn execute(&self, mut ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        let (text, confidence) = ctx
            .extracted_answer()
            .map_or((String::new(), 0.0), |a| (a.answer_text.clone(), a.confidence));
        let result = AnalysisResult::new(ctx.clean_problem_locator(), text, confidence);

        debug!(
            subject_id = ctx.subject_id(),
            removal = ?ctx.removal_signal(),
            answer = ?ctx.answer_signal(),
            "Assembled result"
        );

        ctx.set_postprocessed(
            self.name(),
            PostprocessRecord {
                result,
                status: StageStatus::Completed,
            },
        )?;
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExtractedAnswerRecord;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_empty_context_gives_full_shape() {
        let ctx = PostprocessStage::new()
            .execute(AnalysisContext::new("s", "page.png"))
            .await
            .unwrap();

        assert_eq!(ctx.postprocessed().unwrap().result, AnalysisResult::default());
    }

    #[tokio::test]
    async fn test_copies_answer() {
        let mut ctx = AnalysisContext::new("s", "page.png");
        ctx.set_extracted_answer(
            "extract_answer",
            ExtractedAnswerRecord {
                answer_text: "12".to_string(),
                confidence: 0.9,
                raw_confidence: 0.9,
                ocr_method: "scripted".to_string(),
                answer_region: None,
                status: StageStatus::Completed,
                error: None,
            },
        )
        .unwrap();

        let ctx = PostprocessStage::new().execute(ctx).await.unwrap();
        assert_eq!(ctx.postprocessed().unwrap().result, AnalysisResult::new("", "12", 0.9));
    }

    #[tokio::test]
    async fn test_second_run_conflicts() {
        let ctx = PostprocessStage::new()
            .execute(AnalysisContext::new("s", "page.png"))
            .await
            .unwrap();

        let err = PostprocessStage::new().execute(ctx).await.unwrap_err();
        assert!(matches!(err, AnalysisError::SlotConflict(_)));
    }
}
