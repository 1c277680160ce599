//! Recovery functions applied at the first failure.
//!
//! A recovery function is supplied per invocation, never at pipeline
//! construction. It receives the first failure result and its return value
//! becomes the pipeline's final output verbatim: recovery is a terminal
//! substitution, not a resume.

use crate::result::StageResult;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

/// Trait for recovery functions.
#[async_trait]
pub trait Recovery: Send + Sync {
    /// Turns the first failure into the pipeline's final result.
    async fn recover(&self, failure: StageResult) -> StageResult;
}

/// A synchronous closure-based recovery function.
pub struct RecoveryFn<F>
where
    F: Fn(StageResult) -> StageResult + Send + Sync,
{
    func: F,
}

impl<F> RecoveryFn<F>
where
    F: Fn(StageResult) -> StageResult + Send + Sync,
{
    /// Wraps a synchronous closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Recovery for RecoveryFn<F>
where
    F: Fn(StageResult) -> StageResult + Send + Sync,
{
    async fn recover(&self, failure: StageResult) -> StageResult {
        (self.func)(failure)
    }
}

/// An asynchronous closure-based recovery function.
pub struct AsyncRecoveryFn<F, Fut>
where
    F: Fn(StageResult) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncRecoveryFn<F, Fut>
where
    F: Fn(StageResult) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    /// Wraps an asynchronous closure.
    pub fn new(func: F) -> Self {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> Recovery for AsyncRecoveryFn<F, Fut>
where
    F: Fn(StageResult) -> Fut + Send + Sync,
    Fut: Future<Output = StageResult> + Send,
{
    async fn recover(&self, failure: StageResult) -> StageResult {
        (self.func)(failure).await
    }
}
