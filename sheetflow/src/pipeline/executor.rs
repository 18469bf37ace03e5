//! Sequential stage execution.

use crate::context::AnalysisContext;
use crate::core::StageEvent;
use crate::errors::AnalysisError;
use crate::events::EventSink;
use crate::observability::StageTimer;
use crate::stages::Stage;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The error that aborted a run, with the stage it came from.
#[derive(Debug, Error)]
#[error("Stage '{stage}' aborted the run: {error}")]
pub struct StageFailure {
    /// The failing stage.
    pub stage: String,
    /// The error exactly as the stage returned it.
    #[source]
    pub error: AnalysisError,
}

impl StageFailure {
    /// Converts to the error reported to callers.
    ///
    /// Input-validation and stage errors pass through verbatim; anything else
    /// becomes a generic stage failure carrying the original message.
    #[must_use]
    pub fn into_analysis_error(self) -> AnalysisError {
        match self.error {
            e if e.is_input_validation() => e,
            e @ AnalysisError::StageExecution { .. } => e,
            e => AnalysisError::stage(self.stage, e.to_string()),
        }
    }
}

/// Runs `stages` over `ctx` in order.
///
/// Each stage receives the context the previous one returned. The first
/// error stops the run; nothing is retried.
///
/// # Errors
///
/// Returns the first stage error together with the stage name.
pub async fn run_stages(
    pipeline: &str,
    stages: &[Arc<dyn Stage>],
    ctx: AnalysisContext,
    sink: &dyn EventSink,
) -> Result<AnalysisContext, StageFailure> {
    let subject_id = ctx.subject_id().to_string();
    let run_timer = StageTimer::start(pipeline);

    sink.try_emit(&StageEvent::pipeline_started(pipeline, &subject_id, stages.len()));
    info!(pipeline, subject_id = %subject_id, stages = stages.len(), "Pipeline started");

    let mut ctx = ctx;
    for stage in stages {
        let name = stage.name().to_string();
        let timer = StageTimer::start(&name);
        sink.try_emit(&StageEvent::started(&name, &subject_id));
        debug!(stage = %name, kind = %stage.kind(), "Stage started");

        match stage.execute(ctx).await {
            Ok(next) => {
                let duration_ms = timer.finish();
                sink.try_emit(&StageEvent::completed(&name, &subject_id, duration_ms));
                debug!(stage = %name, duration_ms, "Stage completed");
                ctx = next;
            }
            Err(error) => {
                sink.try_emit(&StageEvent::failed(&name, &subject_id, &error.to_string(), error.kind()));
                warn!(stage = %name, subject_id = %subject_id, error = %error, "Stage failed");
                return Err(StageFailure { stage: name, error });
            }
        }
    }

    let duration_ms = run_timer.finish();
    sink.try_emit(&StageEvent::pipeline_completed(pipeline, &subject_id, duration_ms));
    info!(pipeline, subject_id = %subject_id, duration_ms, "Pipeline completed");
    Ok(ctx)
}

/// An ordered, validated list of stages.
///
/// Built by [`PipelineBuilder`](super::PipelineBuilder). A pipeline holds no
/// per-run state, so one instance can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(super) name: String,
    pub(super) stages: Vec<Arc<dyn Stage>>,
    pub(super) sink: Arc<dyn EventSink>,
}

impl Pipeline {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs the pipeline, returning stage errors unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first stage error.
    pub async fn run(&self, ctx: AnalysisContext) -> Result<AnalysisContext, AnalysisError> {
        self.run_reporting(ctx).await.map_err(|failure| failure.error)
    }

    /// Runs the pipeline, reporting which stage failed.
    ///
    /// # Errors
    ///
    /// Returns the first stage error together with the stage name.
    pub async fn run_reporting(&self, ctx: AnalysisContext) -> Result<AnalysisContext, StageFailure> {
        run_stages(&self.name, &self.stages, ctx, self.sink.as_ref()).await
    }
}
