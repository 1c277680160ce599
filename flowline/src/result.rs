//! The two-variant result returned by every stage.
//!
//! A [`StageResult`] is always exactly one of `Success` or `Failure`; the
//! discriminant is authoritative and callers check it before reading the
//! variant fields. The algebra deliberately carries no chaining or mapping
//! combinators: sequencing lives in the pipeline runner and nowhere else.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Tag identifying a synthetic failure produced when a stage panics.
pub const SYSTEM_ERROR: &str = "system_error";

/// Tag identifying a failure at a typed value boundary.
pub const CONVERSION_ERROR: &str = "conversion_error";

/// A small, comparable error discriminator attached to failures.
///
/// Tags are caller-defined strings; the crate reserves [`SYSTEM_ERROR`]
/// for captured stage faults and [`CONVERSION_ERROR`] for typed-boundary
/// (de)serialization failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorTag(String);

impl ErrorTag {
    /// Creates a caller-defined tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The distinguished tag for captured stage faults.
    #[must_use]
    pub fn system() -> Self {
        Self(SYSTEM_ERROR.to_string())
    }

    /// The distinguished tag for typed-boundary conversion failures.
    #[must_use]
    pub fn conversion() -> Self {
        Self(CONVERSION_ERROR.to_string())
    }

    /// Returns true if this is the system fault tag.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_ERROR
    }

    /// Returns true if this is the conversion failure tag.
    #[must_use]
    pub fn is_conversion(&self) -> bool {
        self.0 == CONVERSION_ERROR
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrorTag {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for ErrorTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// The outcome of running one stage.
///
/// Both variants carry a value: on success it is the value threaded into
/// the next stage, on failure it is whatever the failing stage judged most
/// diagnostic (typically the malformed input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StageResult {
    /// The stage produced a value.
    Success {
        /// The produced value.
        value: Value,
    },
    /// The stage failed.
    Failure {
        /// The value live when the failure occurred.
        value: Value,
        /// The error discriminator.
        error: ErrorTag,
    },
}

impl StageResult {
    /// Creates a success result. Never fails.
    #[must_use]
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success {
            value: value.into(),
        }
    }

    /// Creates a failure result. Never fails.
    #[must_use]
    pub fn failure(value: impl Into<Value>, error: impl Into<ErrorTag>) -> Self {
        Self::Failure {
            value: value.into(),
            error: error.into(),
        }
    }

    /// Returns true if this is the success variant.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true if this is the failure variant.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Returns the carried value, whichever variant this is.
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Success { value } | Self::Failure { value, .. } => value,
        }
    }

    /// Consumes the result and returns the carried value.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Success { value } | Self::Failure { value, .. } => value,
        }
    }

    /// Returns the error tag on failure, `None` on success.
    #[must_use]
    pub fn error_tag(&self) -> Option<&ErrorTag> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success_construction() {
        let result = StageResult::success(42);

        assert!(result.is_success());
        assert!(!result.is_failure());
        assert_eq!(result.value(), &serde_json::json!(42));
        assert_eq!(result.error_tag(), None);
    }

    #[test]
    fn test_failure_construction() {
        let result = StageResult::failure("bad input", "validation_error");

        assert!(result.is_failure());
        assert!(!result.is_success());
        assert_eq!(result.value(), &serde_json::json!("bad input"));
        assert_eq!(
            result.error_tag(),
            Some(&ErrorTag::new("validation_error"))
        );
    }

    #[test]
    fn test_into_value() {
        assert_eq!(
            StageResult::success("out").into_value(),
            serde_json::json!("out")
        );
        assert_eq!(
            StageResult::failure(7, "e").into_value(),
            serde_json::json!(7)
        );
    }

    #[test]
    fn test_distinguished_tags() {
        assert!(ErrorTag::system().is_system());
        assert!(!ErrorTag::system().is_conversion());
        assert!(ErrorTag::conversion().is_conversion());
        assert!(!ErrorTag::new("validation_error").is_system());
        assert_eq!(ErrorTag::system().as_str(), SYSTEM_ERROR);
    }

    #[test]
    fn test_error_tag_display_and_from() {
        let tag: ErrorTag = "parse_error".into();
        assert_eq!(tag.to_string(), "parse_error");

        let owned: ErrorTag = String::from("io_error").into();
        assert_eq!(owned.as_str(), "io_error");
    }

    #[test]
    fn test_serialization_shape() {
        let success = StageResult::success(1);
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json, serde_json::json!({"status": "success", "value": 1}));

        let failure = StageResult::failure(serde_json::Value::Null, "boom_tag");
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "failure", "value": null, "error": "boom_tag"})
        );
    }

    #[test]
    fn test_serialization_round_trip() {
        let original = StageResult::failure(serde_json::json!({"field": "name"}), "missing_field");
        let json = serde_json::to_string(&original).unwrap();
        let decoded: StageResult = serde_json::from_str(&json).unwrap();

        assert_eq!(original, decoded);
    }
}
