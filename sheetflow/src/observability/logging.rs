//! Subscriber setup for binaries.

use crate::errors::AnalysisError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "sheetflow=info";

/// Installs a global subscriber with an env filter and a plain or JSON
/// formatting layer.
///
/// Libraries should not call this; it is meant for the CLI and for hosts
/// that have no subscriber of their own.
///
/// # Errors
///
/// Returns `AnalysisError::Config` if a global subscriber is already set.
pub fn init_tracing(json: bool) -> Result<(), AnalysisError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| AnalysisError::Config(format!("tracing already initialized: {e}")))
}
