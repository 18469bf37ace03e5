//! Observability utilities.

mod logging;
mod timer;

pub use logging::{init_tracing, DEFAULT_DIRECTIVE};
pub use timer::StageTimer;
