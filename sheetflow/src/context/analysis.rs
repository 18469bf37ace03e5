//! The working record threaded through the stages.

use super::records::{
    CleanedProblemRecord, ExtractedAnswerRecord, ExtractedProblemRecord, PostprocessRecord, PreprocessRecord,
    SeparationRecord,
};
use super::{AnswerSignal, AttributeBag, RemovalSignal};
use crate::core::StageStatus;
use crate::errors::SlotConflictError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The working record for one analysis run.
///
/// Stage slots start empty and are filled once. A second write to the same
/// slot is a [`SlotConflictError`]. The context is owned by exactly one run
/// and moves from stage to stage.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisContext {
    subject_id: String,
    source_location: PathBuf,
    preprocessed: Option<PreprocessRecord>,
    separated_layers: Option<SeparationRecord>,
    cleaned_problem: Option<CleanedProblemRecord>,
    extracted_problem: Option<ExtractedProblemRecord>,
    extracted_answer: Option<ExtractedAnswerRecord>,
    postprocessed: Option<PostprocessRecord>,
    /// Cross-cutting metadata.
    pub attributes: AttributeBag,
    created_at: String,
}

fn fill<T>(slot: &mut Option<T>, value: T, name: &str, stage: &str) -> Result<(), SlotConflictError> {
    if slot.is_some() {
        return Err(SlotConflictError::new(name, stage));
    }
    *slot = Some(value);
    Ok(())
}

impl AnalysisContext {
    /// Creates an empty context for a subject.
    #[must_use]
    pub fn new(subject_id: impl Into<String>, source_location: impl Into<PathBuf>) -> Self {
        Self {
            subject_id: subject_id.into(),
            source_location: source_location.into(),
            preprocessed: None,
            separated_layers: None,
            cleaned_problem: None,
            extracted_problem: None,
            extracted_answer: None,
            postprocessed: None,
            attributes: AttributeBag::new(),
            created_at: crate::core::iso_timestamp(),
        }
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Returns the input location as given.
    #[must_use]
    pub fn source_location(&self) -> &Path {
        &self.source_location
    }

    /// Returns when the context was created (ISO 8601).
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// The image later stages must read: the processed location once
    /// preprocessing ran, the source otherwise.
    #[must_use]
    pub fn processed_location(&self) -> &Path {
        self.preprocessed
            .as_ref()
            .map_or(self.source_location.as_path(), |p| p.processed_path.as_path())
    }

    /// Returns the preprocess slot.
    #[must_use]
    pub const fn preprocessed(&self) -> Option<&PreprocessRecord> {
        self.preprocessed.as_ref()
    }

    /// Returns the separation slot.
    #[must_use]
    pub const fn separated_layers(&self) -> Option<&SeparationRecord> {
        self.separated_layers.as_ref()
    }

    /// Returns the clean-problem slot.
    #[must_use]
    pub const fn cleaned_problem(&self) -> Option<&CleanedProblemRecord> {
        self.cleaned_problem.as_ref()
    }

    /// Returns the extract-problem slot.
    #[must_use]
    pub const fn extracted_problem(&self) -> Option<&ExtractedProblemRecord> {
        self.extracted_problem.as_ref()
    }

    /// Returns the extract-answer slot.
    #[must_use]
    pub const fn extracted_answer(&self) -> Option<&ExtractedAnswerRecord> {
        self.extracted_answer.as_ref()
    }

    /// Returns the postprocess slot.
    #[must_use]
    pub const fn postprocessed(&self) -> Option<&PostprocessRecord> {
        self.postprocessed.as_ref()
    }

    /// Fills the preprocess slot.
    ///
    /// # Errors
    ///
    /// Returns `SlotConflictError` if the slot is already set.
    pub fn set_preprocessed(&mut self, stage: &str, record: PreprocessRecord) -> Result<(), SlotConflictError> {
        fill(&mut self.preprocessed, record, "preprocessed", stage)
    }

    /// Fills the separation slot.
    pub fn set_separated_layers(&mut self, stage: &str, record: SeparationRecord) -> Result<(), SlotConflictError> {
        fill(&mut self.separated_layers, record, "separated_layers", stage)
    }

    /// Fills the clean-problem slot.
    pub fn set_cleaned_problem(&mut self, stage: &str, record: CleanedProblemRecord) -> Result<(), SlotConflictError> {
        fill(&mut self.cleaned_problem, record, "cleaned_problem", stage)
    }

    /// Fills the extract-problem slot.
    pub fn set_extracted_problem(
        &mut self,
        stage: &str,
        record: ExtractedProblemRecord,
    ) -> Result<(), SlotConflictError> {
        fill(&mut self.extracted_problem, record, "extracted_problem", stage)
    }

    /// Fills the extract-answer slot.
    pub fn set_extracted_answer(
        &mut self,
        stage: &str,
        record: ExtractedAnswerRecord,
    ) -> Result<(), SlotConflictError> {
        fill(&mut self.extracted_answer, record, "extracted_answer", stage)
    }

    /// Fills the postprocess slot.
    pub fn set_postprocessed(&mut self, stage: &str, record: PostprocessRecord) -> Result<(), SlotConflictError> {
        fill(&mut self.postprocessed, record, "postprocessed", stage)
    }

    /// Locator of the handwriting-free problem image, empty when no stage
    /// produced one.
    #[must_use]
    pub fn clean_problem_locator(&self) -> &str {
        if let Some(problem) = &self.extracted_problem {
            return &problem.problem_image_locator;
        }
        self.cleaned_problem
            .as_ref()
            .map_or("", |c| c.clean_image_locator.as_str())
    }

    /// Classifies the removal outcome.
    #[must_use]
    pub fn removal_signal(&self) -> RemovalSignal {
        let observed = self
            .extracted_problem
            .as_ref()
            .map(|p| (p.status, p.confidence))
            .or_else(|| self.separated_layers.as_ref().map(|s| (s.status, s.confidence)));

        match observed {
            None => RemovalSignal::Unavailable,
            Some((StageStatus::Failed, _)) => RemovalSignal::Failed,
            Some((_, confidence)) if confidence <= 0.0 => RemovalSignal::Fallback,
            Some(_) => RemovalSignal::Separated,
        }
    }

    /// Classifies the answer reading.
    #[must_use]
    pub fn answer_signal(&self) -> AnswerSignal {
        match &self.extracted_answer {
            None => AnswerSignal::Unreadable,
            Some(answer) if answer.status.is_failure() => AnswerSignal::Unreadable,
            Some(answer) if answer.answer_text.is_empty() => AnswerSignal::Unreliable,
            Some(_) => AnswerSignal::Read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NormalizationFlags;

    fn preprocess_record() -> PreprocessRecord {
        PreprocessRecord {
            original_path: PathBuf::from("in.png"),
            processed_path: PathBuf::from("processed.png"),
            byte_size: 10,
            format: ".png".to_string(),
            width: Some(1),
            height: Some(1),
            normalization: NormalizationFlags::default(),
            status: StageStatus::Completed,
        }
    }

    fn problem(status: StageStatus, confidence: f64) -> ExtractedProblemRecord {
        ExtractedProblemRecord {
            problem_file_id: Some("id".to_string()),
            problem_image_path: None,
            problem_image_locator: "/files/id".to_string(),
            separation_method: "grayscale_adaptive_threshold".to_string(),
            confidence,
            handwriting_removed: true,
            status,
            error: None,
        }
    }

    #[test]
    fn test_processed_location_defaults_to_source() {
        let mut ctx = AnalysisContext::new("s", "in.png");
        assert_eq!(ctx.processed_location(), Path::new("in.png"));

        ctx.set_preprocessed("preprocess", preprocess_record()).unwrap();
        assert_eq!(ctx.processed_location(), Path::new("processed.png"));
    }

    #[test]
    fn test_slot_written_once() {
        let mut ctx = AnalysisContext::new("s", "in.png");
        ctx.set_preprocessed("preprocess", preprocess_record()).unwrap();

        let err = ctx.set_preprocessed("again", preprocess_record()).unwrap_err();
        assert_eq!(err.slot, "preprocessed");
        assert_eq!(err.stage, "again");
    }

    #[test]
    fn test_removal_signal() {
        let mut ctx = AnalysisContext::new("s", "in.png");
        assert_eq!(ctx.removal_signal(), RemovalSignal::Unavailable);
        ctx.set_extracted_problem("x", problem(StageStatus::Completed, 0.7)).unwrap();
        assert_eq!(ctx.removal_signal(), RemovalSignal::Separated);

        let mut ctx = AnalysisContext::new("s", "in.png");
        ctx.set_extracted_problem("x", problem(StageStatus::Completed, 0.0)).unwrap();
        assert_eq!(ctx.removal_signal(), RemovalSignal::Fallback);

        let mut ctx = AnalysisContext::new("s", "in.png");
        ctx.set_extracted_problem("x", problem(StageStatus::Failed, 0.0)).unwrap();
        assert_eq!(ctx.removal_signal(), RemovalSignal::Failed);
    }

    #[test]
    fn test_answer_signal_separates_failure_from_unreliable() {
        let mut failed = AnalysisContext::new("s", "in.png");
        failed
            .set_extracted_answer("extract_answer", ExtractedAnswerRecord::failed("tesseract", "decode error"))
            .unwrap();
        assert_eq!(failed.answer_signal(), AnswerSignal::Unreadable);

        let mut unsure = AnalysisContext::new("s", "in.png");
        unsure
            .set_extracted_answer(
                "extract_answer",
                ExtractedAnswerRecord {
                    answer_text: String::new(),
                    confidence: 0.2,
                    raw_confidence: 0.1,
                    ocr_method: "tesseract".to_string(),
                    answer_region: None,
                    status: StageStatus::Completed,
                    error: None,
                },
            )
            .unwrap();
        assert_eq!(unsure.answer_signal(), AnswerSignal::Unreliable);
    }

    #[test]
    fn test_clean_problem_locator_prefers_extracted_problem() {
        let mut ctx = AnalysisContext::new("s", "in.png");
        assert_eq!(ctx.clean_problem_locator(), "");

        ctx.set_cleaned_problem(
            "clean_problem",
            CleanedProblemRecord {
                clean_image_locator: "/files/print".to_string(),
                clean_image_path: None,
                handwriting_removed: true,
                status: StageStatus::Completed,
            },
        )
        .unwrap();
        assert_eq!(ctx.clean_problem_locator(), "/files/print");
    }
}
