//! Pluggable attribute-based policies
//!
//! A policy is an independent business rule: `applies` decides whether it
//! has an opinion on a request, `evaluate` produces that opinion. The engine
//! only calls `evaluate` after `applies` returned true.

use crate::engine::Decision;
use crate::error::Result;
use crate::types::{AccessRequest, Attributes};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub mod content;
pub mod enrollment;
pub mod ownership;
pub mod progress;
pub mod time_window;

pub use content::ContentAccessPolicy;
pub use enrollment::EnrollmentBasedAccessPolicy;
pub use ownership::OwnershipPolicy;
pub use progress::ProgressBasedPolicy;
pub use time_window::TimeBasedAccessPolicy;

/// Attribute-based access rule
#[async_trait]
pub trait Policy: Send + Sync {
    /// Unique name within an engine
    fn name(&self) -> &str;

    /// Priority stamped on this policy's decisions; only priority-aware
    /// combiners read it
    fn priority(&self) -> i32;

    /// Whether this policy has an opinion on the request
    fn applies(&self, request: &AccessRequest) -> bool;

    /// Produce a decision for a request this policy applies to
    async fn evaluate(&self, request: &AccessRequest) -> Result<Decision>;
}

/// The built-in policies in their default registration order
pub fn builtin_policies() -> Vec<Arc<dyn Policy>> {
    let policies: [Arc<dyn Policy>; 5] = [
        Arc::new(EnrollmentBasedAccessPolicy),
        Arc::new(OwnershipPolicy),
        Arc::new(TimeBasedAccessPolicy),
        Arc::new(ProgressBasedPolicy),
        Arc::new(ContentAccessPolicy),
    ];
    Vec::from(policies)
}

pub(crate) fn str_attr<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes.get(key).and_then(Value::as_str)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::{AccessRequest, AuthContext, Resource, Role};

    pub fn request(role: Role, resource_type: &str, action: &str) -> AccessRequest {
        AccessRequest::new(
            AuthContext::new("u1", role),
            Resource::new(resource_type, "r1"),
            action,
        )
    }
}
