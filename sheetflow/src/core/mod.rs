//! Core domain model types for sheetflow.
//!
//! This module contains the small vocabulary shared by every stage:
//! - Slot status and stage kind enums
//! - Lifecycle events emitted by the executor
//! - Artifacts persisted by a stage (the cleaned problem image)

mod artifact;
mod event;
mod status;

pub use artifact::StageArtifact;
pub use event::StageEvent;
pub use status::{StageKind, StageStatus};

/// Returns the current UTC time as an RFC 3339 string.
#[must_use]
pub fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
