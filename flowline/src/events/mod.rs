//! Invocation events and the sinks that receive them.
//!
//! The runner reports every boundary transition as a [`RunEvent`]. Sinks
//! are fire-and-forget: emission must never fail, block, or alter the
//! pipeline's control flow.

use crate::result::ErrorTag;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// A boundary transition observed during one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// The invocation started.
    RunStarted {
        /// The invocation's run ID.
        run_id: Uuid,
        /// Total number of stages, source included.
        stage_count: usize,
    },
    /// A stage began executing.
    StageStarted {
        /// The invocation's run ID.
        run_id: Uuid,
        /// Zero-based position in the chain.
        index: usize,
        /// Diagnostic stage name.
        stage: String,
    },
    /// A stage returned a success result.
    StageSucceeded {
        /// The invocation's run ID.
        run_id: Uuid,
        /// Zero-based position in the chain.
        index: usize,
        /// Diagnostic stage name.
        stage: String,
        /// Stage wall time in milliseconds.
        duration_ms: f64,
    },
    /// A stage returned a failure result, or panicked.
    StageFailed {
        /// The invocation's run ID.
        run_id: Uuid,
        /// Zero-based position in the chain.
        index: usize,
        /// Diagnostic stage name.
        stage: String,
        /// The failure's error tag.
        error: ErrorTag,
        /// True if the failure is a captured panic.
        faulted: bool,
        /// Stage wall time in milliseconds.
        duration_ms: f64,
    },
    /// A recovery function was invoked on the first failure.
    RecoveryApplied {
        /// The invocation's run ID.
        run_id: Uuid,
        /// Index of the stage whose failure was handed to recovery.
        index: usize,
        /// True if recovery returned a success result.
        recovered: bool,
    },
    /// The invocation finished.
    RunFinished {
        /// The invocation's run ID.
        run_id: Uuid,
        /// True if the final result is a success.
        success: bool,
        /// Total wall time in milliseconds.
        duration_ms: f64,
    },
}

impl RunEvent {
    /// Returns the run ID this event belongs to.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::StageStarted { run_id, .. }
            | Self::StageSucceeded { run_id, .. }
            | Self::StageFailed { run_id, .. }
            | Self::RecoveryApplied { run_id, .. }
            | Self::RunFinished { run_id, .. } => *run_id,
        }
    }
}

/// Trait for sinks that receive invocation events.
pub trait EventSink: Send + Sync {
    /// Receives one event. Must not fail or block.
    fn emit(&self, event: &RunEvent);
}

/// A sink that discards all events. The default when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &RunEvent) {
        // Intentionally empty.
    }
}

/// A sink that forwards events to the tracing framework.
///
/// Failures log at WARN, everything else at DEBUG.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &RunEvent) {
        match event {
            RunEvent::StageFailed {
                run_id,
                index,
                stage,
                error,
                faulted,
                ..
            } => {
                warn!(
                    run_id = %run_id,
                    stage_index = index,
                    stage = %stage,
                    error = %error,
                    faulted = faulted,
                    "stage failed"
                );
            }
            other => {
                debug!(run_id = %other.run_id(), event = ?other, "pipeline event");
            }
        }
    }
}

/// A sink that stores every event, for assertions in tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<RunEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &RunEvent) {
        self.events.write().push(event.clone());
    }
}
