//! Error types for the authorization engine
//!
//! A denial is never an error: policies, RBAC and combiners report denials as
//! `Ok(false)` / `Decision { allow: false, .. }`. The variants below cover
//! configuration-time failures (registration) and the few runtime faults that
//! keep the engine from reaching a decision at all.

use thiserror::Error;

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Malformed request or configuration value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A policy with the same name is already registered
    #[error("Policy already registered: {0}")]
    DuplicatePolicy(String),

    /// An attribute provider with the same name is already registered
    #[error("Attribute provider already registered: {0}")]
    DuplicateProvider(String),

    /// Policy not found
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    /// Attribute provider not found
    #[error("Attribute provider not found: {0}")]
    ProviderNotFound(String),

    /// A single policy could not produce a decision
    #[error("Policy evaluation failed: {0}")]
    EvaluationError(String),

    /// An attribute provider could not load attributes
    #[error("Attribute loading failed: {0}")]
    AttributeError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AuthzError::DuplicatePolicy("ownership".to_string());
        assert_eq!(err.to_string(), "Policy already registered: ownership");

        let err = AuthzError::ProviderNotFound("lms".to_string());
        assert_eq!(err.to_string(), "Attribute provider not found: lms");
    }
}
