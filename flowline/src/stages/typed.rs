//! Typed adapters over the dynamic value slot.
//!
//! The pipeline threads `serde_json::Value` between stages; these
//! constructors re-establish concrete types at the stage boundary. A value
//! that fails to cross the boundary in either direction becomes an
//! ordinary failure tagged [`ErrorTag::conversion`], carrying the
//! offending input.

use super::{AsyncStageFn, Source, SourceFn, Stage, StageFn};
use crate::errors::FlowlineError;
use crate::result::{ErrorTag, StageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

fn serialize_output<O: Serialize>(output: O, input: Value) -> StageResult {
    match serde_json::to_value(output) {
        Ok(value) => StageResult::success(value),
        Err(err) => {
            let err = FlowlineError::from(err);
            warn!(error = %err, "typed stage output did not serialize");
            StageResult::failure(input, ErrorTag::conversion())
        }
    }
}

/// Lifts a plain fallible function into a source.
pub fn typed_source<O, E, F>(name: impl Into<String>, func: F) -> Arc<dyn Source>
where
    O: Serialize + 'static,
    E: Into<ErrorTag> + 'static,
    F: Fn() -> Result<O, E> + Send + Sync + 'static,
{
    Arc::new(SourceFn::new(name, move || match func() {
        Ok(output) => serialize_output(output, Value::Null),
        Err(tag) => StageResult::failure(Value::Null, tag),
    }))
}

/// Lifts a plain fallible function into a transform stage.
///
/// The incoming value deserializes to `I` before the function runs; a
/// value that does not conform fails with the conversion tag and the raw
/// input as the diagnostic value.
pub fn typed_stage<I, O, E, F>(name: impl Into<String>, func: F) -> Arc<dyn Stage>
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + 'static,
    E: Into<ErrorTag> + 'static,
    F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
{
    Arc::new(StageFn::new(name, move |input: Value| {
        match serde_json::from_value::<I>(input.clone()) {
            Ok(typed) => match func(typed) {
                Ok(output) => serialize_output(output, input),
                Err(tag) => StageResult::failure(input, tag),
            },
            Err(err) => {
                let err = FlowlineError::from(err);
                warn!(error = %err, "typed stage rejected input");
                StageResult::failure(input, ErrorTag::conversion())
            }
        }
    }))
}

/// Lifts an async fallible function into a transform stage.
pub fn typed_stage_async<I, O, E, F, Fut>(name: impl Into<String>, func: F) -> Arc<dyn Stage>
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + 'static,
    E: Into<ErrorTag> + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
{
    Arc::new(AsyncStageFn::new(name, move |input: Value| {
        // The inner future is created before suspension so the closure only
        // borrows `func` synchronously.
        let attempt = match serde_json::from_value::<I>(input.clone()) {
            Ok(typed) => Ok(func(typed)),
            Err(err) => Err(err),
        };

        async move {
            match attempt {
                Ok(fut) => match fut.await {
                    Ok(output) => serialize_output(output, input),
                    Err(tag) => StageResult::failure(input, tag),
                },
                Err(err) => {
                    let err = FlowlineError::from(err);
                    warn!(error = %err, "typed stage rejected input");
                    StageResult::failure(input, ErrorTag::conversion())
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Order {
        id: u64,
        total_cents: i64,
    }

    #[tokio::test]
    async fn test_typed_source_produces_value() {
        let source = typed_source("order", || {
            Ok::<_, ErrorTag>(Order {
                id: 7,
                total_cents: 1250,
            })
        });

        let result = source.run().await;
        assert_eq!(
            result,
            StageResult::success(serde_json::json!({"id": 7, "total_cents": 1250}))
        );
    }

    #[tokio::test]
    async fn test_typed_stage_round_trips_types() {
        let stage = typed_stage("discount", |order: Order| {
            Ok::<_, ErrorTag>(Order {
                id: order.id,
                total_cents: order.total_cents - 250,
            })
        });

        let result = stage
            .run(serde_json::json!({"id": 7, "total_cents": 1250}))
            .await;

        assert_eq!(
            result,
            StageResult::success(serde_json::json!({"id": 7, "total_cents": 1000}))
        );
    }

    #[tokio::test]
    async fn test_typed_stage_domain_error_keeps_tag() {
        let stage = typed_stage("validate", |order: Order| {
            if order.total_cents < 0 {
                Err("negative_total")
            } else {
                Ok(order)
            }
        });

        let input = serde_json::json!({"id": 1, "total_cents": -5});
        let result = stage.run(input.clone()).await;

        assert_eq!(result, StageResult::failure(input, "negative_total"));
    }

    #[tokio::test]
    async fn test_typed_stage_conversion_failure() {
        let stage = typed_stage("parse", |n: i64| Ok::<_, ErrorTag>(n + 1));

        let input = serde_json::json!("not a number");
        let result = stage.run(input.clone()).await;

        assert!(result.is_failure());
        assert_eq!(result.value(), &input);
        assert!(result.error_tag().is_some_and(ErrorTag::is_conversion));
    }

    #[tokio::test]
    async fn test_typed_stage_async() {
        let stage = typed_stage_async("double", |n: i64| async move { Ok::<_, ErrorTag>(n * 2) });

        assert_eq!(
            stage.run(serde_json::json!(21)).await,
            StageResult::success(42)
        );
    }

    #[tokio::test]
    async fn test_typed_stage_async_conversion_failure() {
        let stage = typed_stage_async("inc", |n: i64| async move { Ok::<_, ErrorTag>(n + 1) });

        let result = stage.run(serde_json::json!(null)).await;
        assert!(result.error_tag().is_some_and(ErrorTag::is_conversion));
    }
}
