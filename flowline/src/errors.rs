//! Error types for the flowline crate.
//!
//! These errors never cross the stage-facing contract: stages and
//! pipelines always communicate through [`crate::StageResult`]. The types
//! here describe what went wrong on the library's side of a boundary
//! (a typed conversion, a captured panic) for logging and diagnostics.

use std::any::Any;
use thiserror::Error;

/// The main error type for flowline internals.
#[derive(Debug, Error)]
pub enum FlowlineError {
    /// A value failed to cross a typed stage boundary.
    #[error("conversion failed at typed stage boundary: {0}")]
    Conversion(#[from] serde_json::Error),

    /// A stage panicked and the fault was captured at the boundary.
    #[error("stage fault: {message}")]
    Fault {
        /// The captured panic message.
        message: String,
    },
}

impl FlowlineError {
    /// Creates a fault error from a captured panic payload.
    ///
    /// Panic payloads are almost always `&str` or `String`; anything else
    /// is reported opaquely.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload.downcast_ref::<&str>().map_or_else(
            || {
                payload
                    .downcast_ref::<String>()
                    .cloned()
                    .unwrap_or_else(|| "non-string panic payload".to_string())
            },
            |s| (*s).to_string(),
        );

        Self::Fault { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_from_str_payload() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let err = FlowlineError::from_panic(payload.as_ref());

        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_fault_from_string_payload() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("exploded"));
        let err = FlowlineError::from_panic(payload.as_ref());

        assert!(err.to_string().contains("exploded"));
    }

    #[test]
    fn test_fault_from_opaque_payload() {
        let payload: Box<dyn Any + Send> = Box::new(17_u32);
        let err = FlowlineError::from_panic(payload.as_ref());

        assert!(err.to_string().contains("non-string panic payload"));
    }

    #[test]
    fn test_conversion_from_serde_error() {
        let serde_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: FlowlineError = serde_err.into();

        assert!(matches!(err, FlowlineError::Conversion(_)));
    }
}
