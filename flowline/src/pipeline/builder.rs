//! Fluent pipeline construction.
//!
//! The builder pair encodes the chain's shape in types: transforms can
//! only be appended once a source exists, so an ill-formed chain is
//! unrepresentable rather than a runtime validation error.

use crate::events::EventSink;
use crate::result::StageResult;
use crate::stages::{AsyncSourceFn, AsyncStageFn, Source, SourceFn, Stage, StageFn};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::runner::Pipeline;

/// Entry point of the fluent builder. Holds no stages yet.
#[derive(Default)]
pub struct PipelineBuilder {
    sink: Option<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl PipelineBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets a synchronous closure as the source.
    #[must_use]
    pub fn source<F>(self, func: F) -> SourcedPipelineBuilder
    where
        F: Fn() -> StageResult + Send + Sync + 'static,
    {
        self.source_stage(Arc::new(SourceFn::new("source", func)))
    }

    /// Sets an asynchronous closure as the source.
    #[must_use]
    pub fn source_async<F, Fut>(self, func: F) -> SourcedPipelineBuilder
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StageResult> + Send + 'static,
    {
        self.source_stage(Arc::new(AsyncSourceFn::new("source", func)))
    }

    /// Sets an already-constructed source.
    #[must_use]
    pub fn source_stage(self, source: Arc<dyn Source>) -> SourcedPipelineBuilder {
        SourcedPipelineBuilder {
            source,
            transforms: Vec::new(),
            sink: self.sink,
        }
    }

    /// Builds the empty pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        match self.sink {
            Some(sink) => Pipeline::empty().with_event_sink(sink),
            None => Pipeline::empty(),
        }
    }
}

/// A builder that has its source and accepts transforms.
pub struct SourcedPipelineBuilder {
    source: Arc<dyn Source>,
    transforms: Vec<Arc<dyn Stage>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for SourcedPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcedPipelineBuilder")
            .field("source", &self.source.name())
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

impl SourcedPipelineBuilder {
    /// Appends a synchronous closure as the next transform.
    #[must_use]
    pub fn then<F>(self, func: F) -> Self
    where
        F: Fn(Value) -> StageResult + Send + Sync + 'static,
    {
        let name = format!("stage_{}", self.transforms.len() + 1);
        self.stage(Arc::new(StageFn::new(name, func)))
    }

    /// Appends an asynchronous closure as the next transform.
    #[must_use]
    pub fn then_async<F, Fut>(self, func: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StageResult> + Send + 'static,
    {
        let name = format!("stage_{}", self.transforms.len() + 1);
        self.stage(Arc::new(AsyncStageFn::new(name, func)))
    }

    /// Appends an already-constructed transform.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.transforms.push(stage);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let pipeline = Pipeline::new(self.source, self.transforms);
        match self.sink {
            Some(sink) => pipeline.with_event_sink(sink),
            None => pipeline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::IdentityStage;

    #[test]
    fn test_empty_builder() {
        let pipeline = PipelineBuilder::new().build();
        assert_eq!(pipeline.stage_count(), 0);
    }

    #[test]
    fn test_builder_counts_stages() {
        let pipeline = Pipeline::builder()
            .source(|| StageResult::success(1))
            .then(|v| StageResult::success(v))
            .stage(Arc::new(IdentityStage::new("identity")))
            .build();

        assert_eq!(pipeline.stage_count(), 3);
    }

    #[test]
    fn test_builder_debug_reports_shape() {
        let builder = Pipeline::builder().source(|| StageResult::success(1));
        let rendered = format!("{builder:?}");

        assert!(rendered.contains("source"));
        assert!(rendered.contains("transforms"));
    }
}
