//! Run identity for correlating pipeline invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single pipeline invocation.
///
/// A fresh identity is generated for every invocation; it appears in log
/// fields and emitted events so concurrent invocations of the same
/// pipeline can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// The unique ID for this invocation.
    pub run_id: Uuid,
    /// When the invocation started.
    pub started_at: DateTime<Utc>,
}

impl RunIdentity {
    /// Creates a new identity with a generated run ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// Creates an identity with a specific run ID.
    #[must_use]
    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
        }
    }

    /// Returns the run ID as a string.
    #[must_use]
    pub fn run_id_str(&self) -> String {
        self.run_id.to_string()
    }
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_identity_new_is_unique() {
        let a = RunIdentity::new();
        let b = RunIdentity::new();

        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_run_identity_with_run_id() {
        let id = Uuid::new_v4();
        let identity = RunIdentity::with_run_id(id);

        assert_eq!(identity.run_id, id);
        assert_eq!(identity.run_id_str(), id.to_string());
    }

    #[test]
    fn test_run_identity_serialization() {
        let identity = RunIdentity::new();
        let json = serde_json::to_string(&identity).unwrap();
        let decoded: RunIdentity = serde_json::from_str(&json).unwrap();

        assert_eq!(identity, decoded);
    }
}
