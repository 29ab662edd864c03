//! Policy and engine decision types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Allow/deny outcome without rationale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effect {
    Allow,
    Deny,
}

/// Verdict produced by a single policy or by the engine as a whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the request is allowed
    pub allow: bool,

    /// Human-readable rationale, kept for audit logs
    pub reason: String,

    /// Priority of the policy that produced it (stamped by the engine)
    #[serde(default)]
    pub priority: i32,

    /// Additional metadata
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Decision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self::from_effect(Effect::Allow, reason)
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self::from_effect(Effect::Deny, reason)
    }

    pub fn from_effect(effect: Effect, reason: impl Into<String>) -> Self {
        Self {
            allow: effect == Effect::Allow,
            reason: reason.into(),
            priority: 0,
            metadata: HashMap::new(),
        }
    }

    pub fn effect(&self) -> Effect {
        if self.allow {
            Effect::Allow
        } else {
            Effect::Deny
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Add metadata to the decision
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_decision() {
        let decision = Decision::allow("enrolled");

        assert!(decision.allow);
        assert_eq!(decision.effect(), Effect::Allow);
        assert_eq!(decision.priority, 0);
    }

    #[test]
    fn test_deny_decision_with_metadata() {
        let decision = Decision::deny("not enrolled")
            .with_priority(100)
            .with_metadata("policy", "enrollment_based_access");

        assert!(!decision.allow);
        assert_eq!(decision.priority, 100);
        assert_eq!(decision.metadata["policy"], "enrollment_based_access");
    }
}
