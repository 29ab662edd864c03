use async_trait::async_trait;

use super::Policy;
use crate::engine::Decision;
use crate::error::Result;
use crate::types::{attr, AccessRequest};

/// Gates resources behind a minimum course completion percentage.
///
/// A student without any `progress` is denied, but non-numeric `progress`
/// or `required_progress` values let the request through.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressBasedPolicy;

#[async_trait]
impl Policy for ProgressBasedPolicy {
    fn name(&self) -> &str {
        "progress_based"
    }

    fn priority(&self) -> i32 {
        75
    }

    fn applies(&self, request: &AccessRequest) -> bool {
        request.subject.role.is_student()
            && request.resource.attributes.contains_key(attr::REQUIRED_PROGRESS)
    }

    async fn evaluate(&self, request: &AccessRequest) -> Result<Decision> {
        let Some(progress) = request.subject.attributes.get(attr::PROGRESS) else {
            return Ok(Decision::deny("No progress information for user"));
        };

        let required = request
            .resource
            .attributes
            .get(attr::REQUIRED_PROGRESS)
            .and_then(|value| value.as_f64());

        let (Some(progress), Some(required)) = (progress.as_f64(), required) else {
            return Ok(Decision::allow("Progress values are not numeric, check skipped"));
        };

        if progress < required {
            Ok(Decision::deny(format!(
                "Insufficient progress: {:.1}% of {:.1}% required",
                progress, required
            ))
            .with_metadata(attr::PROGRESS, progress)
            .with_metadata(attr::REQUIRED_PROGRESS, required))
        } else {
            Ok(Decision::allow("Progress requirement met"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::request;
    use crate::types::{Permission, Role};
    use serde_json::json;

    fn gated(progress: Option<serde_json::Value>, required: serde_json::Value) -> AccessRequest {
        let mut req = request(Role::student(), "assignment", Permission::VIEW_ASSIGNMENTS);
        req.resource.attributes.insert(attr::REQUIRED_PROGRESS.into(), required);
        if let Some(progress) = progress {
            req.subject.attributes.insert(attr::PROGRESS.into(), progress);
        }
        req
    }

    #[test]
    fn test_applies_to_students_with_requirement() {
        let req = gated(None, json!(50.0));
        assert!(ProgressBasedPolicy.applies(&req));

        let mut req = req;
        req.subject.role = Role::instructor();
        assert!(!ProgressBasedPolicy.applies(&req));

        let req = request(Role::student(), "assignment", Permission::VIEW_ASSIGNMENTS);
        assert!(!ProgressBasedPolicy.applies(&req));
    }

    #[tokio::test]
    async fn test_threshold() {
        assert!(ProgressBasedPolicy.evaluate(&gated(Some(json!(75.0)), json!(50.0))).await.unwrap().allow);
        assert!(ProgressBasedPolicy.evaluate(&gated(Some(json!(50)), json!(50.0))).await.unwrap().allow);

        let decision = ProgressBasedPolicy.evaluate(&gated(Some(json!(30.0)), json!(50.0))).await.unwrap();
        assert!(!decision.allow);
        assert_eq!(decision.reason, "Insufficient progress: 30.0% of 50.0% required");
    }

    #[tokio::test]
    async fn test_missing_progress_denies() {
        assert!(!ProgressBasedPolicy.evaluate(&gated(None, json!(50.0))).await.unwrap().allow);
    }

    #[tokio::test]
    async fn test_type_mismatch_allows() {
        assert!(ProgressBasedPolicy.evaluate(&gated(Some(json!("high")), json!(50.0))).await.unwrap().allow);
        assert!(ProgressBasedPolicy.evaluate(&gated(Some(json!(10.0)), json!("half"))).await.unwrap().allow);
    }
}
