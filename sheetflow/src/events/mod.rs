//! Event sink system for observability.
//!
//! The executor reports lifecycle events to a sink handed to it at build
//! time. There is no process-wide sink: concurrent runs share nothing but
//! their immutable pipeline configuration.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
