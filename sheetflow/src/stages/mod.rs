//! Stage trait and implementations.
//!
//! Stages are the units of work of an analysis pipeline. Each one takes the
//! context by value, fills its own slot and hands the context on.

mod extract_answer;
mod postprocess;
mod preprocess;
mod separation;

pub use extract_answer::ExtractAnswerStage;
pub use postprocess::PostprocessStage;
pub use preprocess::{NormalizedPage, PageNormalizer, PassthroughNormalizer, PreprocessStage};
pub use separation::{CleanProblemStage, ExtractProblemStage, SeparatePrintHandStage};

use crate::context::AnalysisContext;
use crate::core::StageKind;
use crate::errors::AnalysisError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Stage names used by the built-in stages and their events.
pub mod names {
    /// Input validation and normalization.
    pub const PREPROCESS: &str = "preprocess";
    /// Print/hand layer separation.
    pub const SEPARATE_PRINT_HAND: &str = "separate_print_hand";
    /// Clean problem from the print layer.
    pub const CLEAN_PROBLEM: &str = "clean_problem";
    /// Single-step handwriting removal and storage.
    pub const EXTRACT_PROBLEM: &str = "extract_problem";
    /// Answer OCR.
    pub const EXTRACT_ANSWER: &str = "extract_answer";
    /// Result assembly.
    pub const POSTPROCESS: &str = "postprocess";
}

/// Trait for pipeline stages.
///
/// A stage reads earlier slots and fills its own. It must never overwrite a
/// slot another stage filled.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Returns the kind of work the stage does.
    fn kind(&self) -> StageKind {
        StageKind::Work
    }

    /// Executes the stage.
    ///
    /// # Errors
    ///
    /// Any error aborts the run; the executor does not retry.
    async fn execute(&self, ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(AnalysisContext) -> Result<AnalysisContext, AnalysisError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(AnalysisContext) -> Result<AnalysisContext, AnalysisError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(AnalysisContext) -> Result<AnalysisContext, AnalysisError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(AnalysisContext) -> Result<AnalysisContext, AnalysisError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        (self.func)(ctx)
    }
}
