//! # Sheetflow
//!
//! Worksheet analysis: separate the printed problem from the handwritten
//! answer and read the answer with a confidence score.
//!
//! Sheetflow provides:
//!
//! - **Sequential stage execution**: a fail-fast executor threading one
//!   context through an ordered list of stages
//! - **Handwriting removal**: pluggable strategies selected by configuration
//! - **Answer OCR**: confidence aggregation over an external engine
//! - **Event-driven observability**: lifecycle events and structured logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetflow::prelude::*;
//!
//! let pipeline = AnalyzePipeline::from_config(&AnalyzerConfig::default())?;
//! let result = pipeline.analyze("subject-1", "worksheet.png").await?;
//! println!("{}", result.analysis.answer.text);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod imaging;
pub mod observability;
pub mod ocr;
pub mod pipeline;
pub mod removal;
pub mod stages;
pub mod storage;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::AnalyzerConfig;
    pub use crate::context::{
        AnalysisContext, AnalysisResult, AnswerResult, AnswerSignal, AttributeBag, PipelineResult,
        RemovalSignal,
    };
    pub use crate::core::{StageArtifact, StageEvent, StageKind, StageStatus};
    pub use crate::errors::{AnalysisError, PipelineValidationError, SlotConflictError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::ocr::{OcrEngine, OcrRequest, OcrToken, TesseractEngine};
    pub use crate::pipeline::{AnalyzePipeline, Pipeline, PipelineBuilder, PipelineLayout};
    pub use crate::removal::{
        build_remover, remove_handwriting, HandwritingRemover, RemovalOutcome, RemoverKind, ThresholdParams,
    };
    pub use crate::stages::Stage;
    pub use crate::storage::{ArtifactStore, LocalArtifactStore};
}
