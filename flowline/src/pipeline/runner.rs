//! The pipeline type and its execution engine.

use crate::errors::FlowlineError;
use crate::events::{EventSink, NoOpEventSink, RunEvent};
use crate::identity::RunIdentity;
use crate::recovery::Recovery;
use crate::result::{ErrorTag, StageResult};
use crate::stages::{Source, Stage};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::builder::PipelineBuilder;

/// Summary of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The invocation identity.
    pub identity: RunIdentity,
    /// Number of stages that began executing, source included.
    pub stages_run: usize,
    /// Index of the first failing stage, if any stage failed.
    pub failed_stage: Option<usize>,
    /// True if a recovery function was invoked.
    pub recovery_applied: bool,
    /// Total wall time in milliseconds.
    pub duration_ms: f64,
}

/// An immutable, linear chain of stages.
///
/// A pipeline is one optional source followed by zero or more transforms,
/// captured at construction. Invoking it threads a value through the
/// chain, stops at the first failure, and optionally hands that failure to
/// a per-invocation recovery function. Every invocation owns its own
/// threading state, so one pipeline can be run any number of times,
/// concurrently or not.
pub struct Pipeline {
    source: Option<Arc<dyn Source>>,
    transforms: Vec<Arc<dyn Stage>>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source.as_ref().map(|s| s.name().to_string()))
            .field(
                "transforms",
                &self
                    .transforms
                    .iter()
                    .map(|s| s.name().to_string())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::empty()
    }
}

impl Pipeline {
    /// Creates a pipeline with no stages.
    ///
    /// Running it yields `Success(null)` without invoking anything.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            source: None,
            transforms: Vec::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Creates a pipeline from a source and an ordered transform list.
    #[must_use]
    pub fn new(source: Arc<dyn Source>, transforms: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            source: Some(source),
            transforms,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Starts a fluent builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the number of stages, source included.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        usize::from(self.source.is_some()) + self.transforms.len()
    }

    /// Runs the pipeline without recovery.
    ///
    /// The first failure, if any, is the final result.
    pub async fn run(&self) -> StageResult {
        self.run_reported(None).await.0
    }

    /// Runs the pipeline, handing the first failure to `recovery`.
    ///
    /// Whatever `recovery` returns is the final result verbatim; no
    /// further stage executes after it.
    pub async fn run_with_recovery(&self, recovery: &dyn Recovery) -> StageResult {
        self.run_reported(Some(recovery)).await.0
    }

    /// Runs the pipeline and also returns an invocation summary.
    ///
    /// This is the single execution engine; [`Pipeline::run`] and
    /// [`Pipeline::run_with_recovery`] delegate to it.
    pub async fn run_reported(
        &self,
        recovery: Option<&dyn Recovery>,
    ) -> (StageResult, RunReport) {
        let identity = RunIdentity::new();
        let run_id = identity.run_id;
        let start = Instant::now();

        self.sink.emit(&RunEvent::RunStarted {
            run_id,
            stage_count: self.stage_count(),
        });
        debug!(run_id = %run_id, stages = self.stage_count(), "pipeline run started");

        let Some(source) = self.source.as_ref() else {
            // Empty chain: no stage executes and recovery is never invoked.
            let result = StageResult::success(Value::Null);
            let report = self.finish(identity, start, 0, None, false, &result);
            return (result, report);
        };

        let (outcome, _) = self
            .run_boundary(run_id, 0, source.name(), Value::Null, source.run())
            .await;
        let mut stages_run = 1;

        if outcome.is_failure() {
            let (result, applied) = self.resolve_failure(run_id, 0, outcome, recovery).await;
            let report = self.finish(identity, start, stages_run, Some(0), applied, &result);
            return (result, report);
        }

        let mut current = outcome.into_value();

        for (offset, stage) in self.transforms.iter().enumerate() {
            let index = offset + 1;
            let (outcome, _) = self
                .run_boundary(
                    run_id,
                    index,
                    stage.name(),
                    current.clone(),
                    stage.run(current.clone()),
                )
                .await;
            stages_run += 1;

            if outcome.is_failure() {
                let (result, applied) =
                    self.resolve_failure(run_id, index, outcome, recovery).await;
                let report =
                    self.finish(identity, start, stages_run, Some(index), applied, &result);
                return (result, report);
            }

            current = outcome.into_value();
        }

        let result = StageResult::success(current);
        let report = self.finish(identity, start, stages_run, None, false, &result);
        (result, report)
    }

    /// Runs one stage future inside the fault guard and emits the
    /// boundary events. Returns the outcome and whether it was a captured
    /// fault.
    async fn run_boundary<Fut>(
        &self,
        run_id: uuid::Uuid,
        index: usize,
        stage: &str,
        input: Value,
        fut: Fut,
    ) -> (StageResult, bool)
    where
        Fut: Future<Output = StageResult>,
    {
        self.sink.emit(&RunEvent::StageStarted {
            run_id,
            index,
            stage: stage.to_string(),
        });

        let stage_start = Instant::now();
        let (outcome, faulted) = guard(fut, input).await;
        let duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0;

        match &outcome {
            StageResult::Success { .. } => {
                self.sink.emit(&RunEvent::StageSucceeded {
                    run_id,
                    index,
                    stage: stage.to_string(),
                    duration_ms,
                });
            }
            StageResult::Failure { error, .. } => {
                self.sink.emit(&RunEvent::StageFailed {
                    run_id,
                    index,
                    stage: stage.to_string(),
                    error: error.clone(),
                    faulted,
                    duration_ms,
                });
            }
        }

        (outcome, faulted)
    }

    /// Applies the recovery-or-passthrough rule to the first failure.
    ///
    /// Returns the final result and whether recovery was invoked.
    async fn resolve_failure(
        &self,
        run_id: uuid::Uuid,
        index: usize,
        failure: StageResult,
        recovery: Option<&dyn Recovery>,
    ) -> (StageResult, bool) {
        let Some(recovery) = recovery else {
            return (failure, false);
        };

        // A panicking recovery function is guarded like any other stage
        // boundary; its synthetic failure carries the original failure's
        // diagnostic value.
        let diagnostic = failure.value().clone();
        let (result, _) = guard(recovery.recover(failure), diagnostic).await;

        self.sink.emit(&RunEvent::RecoveryApplied {
            run_id,
            index,
            recovered: result.is_success(),
        });

        (result, true)
    }

    fn finish(
        &self,
        identity: RunIdentity,
        start: Instant,
        stages_run: usize,
        failed_stage: Option<usize>,
        recovery_applied: bool,
        result: &StageResult,
    ) -> RunReport {
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.sink.emit(&RunEvent::RunFinished {
            run_id: identity.run_id,
            success: result.is_success(),
            duration_ms,
        });
        debug!(
            run_id = %identity.run_id,
            success = result.is_success(),
            duration_ms,
            "pipeline run finished"
        );

        RunReport {
            identity,
            stages_run,
            failed_stage,
            recovery_applied,
            duration_ms,
        }
    }
}

/// Awaits a stage future, converting a panic into a synthetic failure
/// tagged [`ErrorTag::system`] that carries the stage's input.
async fn guard<Fut>(fut: Fut, input: Value) -> (StageResult, bool)
where
    Fut: Future<Output = StageResult>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => (result, false),
        Err(payload) => {
            let err = FlowlineError::from_panic(payload.as_ref());
            warn!(error = %err, "captured stage fault");
            (StageResult::failure(input, ErrorTag::system()), true)
        }
    }
}
