//! # Flowline
//!
//! A sequential value-threading pipeline with typed failures and recovery.
//!
//! Flowline composes a chain of stages into a single callable pipeline:
//!
//! - **Two-variant results**: every stage returns success or a tagged
//!   failure, nothing else
//! - **Fail-fast sequencing**: the first failure stops the chain
//! - **Terminal recovery**: an optional per-invocation function turns the
//!   first failure into the final result
//! - **Sync/async uniformity**: plain and future-returning stages share
//!   one calling convention
//! - **Fault capture**: a panicking stage becomes an ordinary
//!   system-tagged failure
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flowline::prelude::*;
//!
//! let pipeline = Pipeline::builder()
//!     .source(|| StageResult::success(1))
//!     .then(|v| StageResult::success(v.as_i64().unwrap_or(0) + 1))
//!     .then_async(|v| async move { StageResult::success(v.as_i64().unwrap_or(0) * 2) })
//!     .build();
//!
//! let result = pipeline.run().await;
//! assert_eq!(result, StageResult::success(4));
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

pub mod errors;
pub mod events;
pub mod identity;
pub mod pipeline;
pub mod recovery;
pub mod result;
pub mod stages;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::FlowlineError;
    pub use crate::events::{
        CollectingEventSink, EventSink, NoOpEventSink, RunEvent, TracingEventSink,
    };
    pub use crate::identity::RunIdentity;
    pub use crate::pipeline::{Pipeline, PipelineBuilder, RunReport, SourcedPipelineBuilder};
    pub use crate::recovery::{AsyncRecoveryFn, Recovery, RecoveryFn};
    pub use crate::result::{ErrorTag, StageResult, CONVERSION_ERROR, SYSTEM_ERROR};
    pub use crate::stages::{
        typed_source, typed_stage, typed_stage_async, AsyncSourceFn, AsyncStageFn,
        IdentityStage, Source, SourceFn, Stage, StageFn,
    };
}

pub use errors::FlowlineError;
pub use pipeline::{Pipeline, PipelineBuilder, RunReport};
pub use recovery::Recovery;
pub use result::{ErrorTag, StageResult};
pub use stages::{Source, Stage};

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn crate_surface_composes() {
        let pipeline = Pipeline::builder()
            .source(|| StageResult::success("ping"))
            .stage(Arc::new(IdentityStage::new("echo")))
            .build();

        assert_eq!(pipeline.run().await, StageResult::success("ping"));
    }
}
