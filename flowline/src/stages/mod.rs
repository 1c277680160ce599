//! Stage traits and function adapters.
//!
//! A pipeline is one [`Source`] followed by any number of [`Stage`]s. Both
//! traits are async; synchronous closures adapt through the `*Fn` wrappers
//! so mixed pipelines go through a single calling convention.

mod typed;

pub use typed::{typed_source, typed_stage, typed_stage_async};

use crate::result::StageResult;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;

/// The first stage of a pipeline. Takes no input.
#[async_trait]
pub trait Source: Send + Sync + Debug {
    /// Diagnostic name used in logs and events.
    fn name(&self) -> &str {
        "source"
    }

    /// Produces the initial result.
    async fn run(&self) -> StageResult;
}

/// Any stage after the first. Consumes the prior stage's success value.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Diagnostic name used in logs and events.
    fn name(&self) -> &str {
        "stage"
    }

    /// Transforms the threaded value into a new result.
    async fn run(&self, input: Value) -> StageResult;
}

/// A synchronous function-based source.
pub struct SourceFn<F>
where
    F: Fn() -> StageResult + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> SourceFn<F>
where
    F: Fn() -> StageResult + Send + Sync,
{
    /// Creates a new function-based source.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for SourceFn<F>
where
    F: Fn() -> StageResult + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Source for SourceFn<F>
where
    F: Fn() -> StageResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> StageResult {
        (self.func)()
    }
}

/// An asynchronous function-based source.
pub struct AsyncSourceFn<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    name: String,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncSourceFn<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    /// Creates a new async function-based source.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Debug for AsyncSourceFn<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSourceFn")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Source for AsyncSourceFn<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> StageResult {
        (self.func)().await
    }
}

/// A synchronous function-based transform stage.
pub struct StageFn<F>
where
    F: Fn(Value) -> StageResult + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> StageFn<F>
where
    F: Fn(Value) -> StageResult + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for StageFn<F>
where
    F: Fn(Value) -> StageResult + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageFn").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Stage for StageFn<F>
where
    F: Fn(Value) -> StageResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: Value) -> StageResult {
        (self.func)(input)
    }
}

/// An asynchronous function-based transform stage.
pub struct AsyncStageFn<F, Fut>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    name: String,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncStageFn<F, Fut>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    /// Creates a new async function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Debug for AsyncStageFn<F, Fut>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncStageFn")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Stage for AsyncStageFn<F, Fut>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: Value) -> StageResult {
        (self.func)(input).await
    }
}

/// A stage that passes its input through unchanged. Useful in tests.
#[derive(Debug, Clone)]
pub struct IdentityStage {
    name: String,
}

impl IdentityStage {
    /// Creates a new identity stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for IdentityStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: Value) -> StageResult {
        StageResult::success(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_fn() {
        let source = SourceFn::new("one", || StageResult::success(1));

        assert_eq!(source.name(), "one");

        let result = tokio_test::block_on(source.run());
        assert_eq!(result, StageResult::success(1));
    }

    #[test]
    fn test_stage_fn() {
        let stage = StageFn::new("stringify", |input| {
            StageResult::success(input.to_string())
        });

        let result = tokio_test::block_on(stage.run(serde_json::json!(5)));
        assert_eq!(result, StageResult::success("5"));
    }

    #[tokio::test]
    async fn test_async_source_fn() {
        let source = AsyncSourceFn::new("async-one", || async { StageResult::success(1) });

        assert_eq!(source.name(), "async-one");
        assert_eq!(source.run().await, StageResult::success(1));
    }

    #[tokio::test]
    async fn test_async_stage_fn() {
        let stage = AsyncStageFn::new("double", |input: Value| async move {
            match input.as_i64() {
                Some(n) => StageResult::success(n * 2),
                None => StageResult::failure(input, "not_a_number"),
            }
        });

        assert_eq!(stage.run(serde_json::json!(4)).await, StageResult::success(8));
        assert!(stage.run(serde_json::json!("x")).await.is_failure());
    }

    #[tokio::test]
    async fn test_identity_stage() {
        let stage = IdentityStage::new("identity");
        let input = serde_json::json!({"k": [1, 2, 3]});

        assert_eq!(
            stage.run(input.clone()).await,
            StageResult::success(input)
        );
    }

    #[test]
    fn test_adapter_debug_omits_closure() {
        let stage = StageFn::new("named", |input| StageResult::success(input));
        let rendered = format!("{stage:?}");

        assert!(rendered.contains("named"));
    }
}
