//! Pipeline building and execution.
//!
//! This module provides:
//! - A fail-fast sequential executor
//! - A pipeline builder with validation
//! - The assembled worksheet analysis pipeline

mod analyze;
mod builder;
mod executor;

pub use analyze::{AnalyzePipeline, PipelineLayout};
pub use builder::PipelineBuilder;
pub use executor::{run_stages, Pipeline, StageFailure};
