//! The per-run analysis context and result model.
//!
//! This module provides:
//! - The [`AnalysisContext`] moved through the stages of one run
//! - Typed records for each stage slot
//! - The stable [`AnalysisResult`] handed to callers

mod analysis;
mod attributes;
mod records;
mod result;

pub use analysis::AnalysisContext;
pub use attributes::AttributeBag;
pub use records::{
    AnswerRegion, CleanedProblemRecord, ExtractedAnswerRecord, ExtractedProblemRecord, NormalizationFlags,
    PostprocessRecord, PreprocessRecord, SeparationRecord,
};
pub use result::{AnalysisResult, AnswerResult, AnswerSignal, PipelineResult, RemovalSignal};
