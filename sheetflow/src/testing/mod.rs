//! Testing utilities for sheetflow pipelines.
//!
//! This module provides:
//! - A scripted OCR engine
//! - Failing and recording stages
//! - Image fixtures

pub mod fixtures;
mod mocks;

pub use mocks::{FailingStage, RecordingStage, ScriptedOcrEngine};
