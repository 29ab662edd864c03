use async_trait::async_trait;

use super::Policy;
use crate::engine::Decision;
use crate::error::Result;
use crate::types::AccessRequest;

/// Lets privileged roles through on `content` resources. It never denies;
/// everyone else is left to the other policies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentAccessPolicy;

#[async_trait]
impl Policy for ContentAccessPolicy {
    fn name(&self) -> &str {
        "content_access"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn applies(&self, request: &AccessRequest) -> bool {
        request.resource.resource_type == "content"
    }

    async fn evaluate(&self, request: &AccessRequest) -> Result<Decision> {
        let role = &request.subject.role;
        if role.is_admin() || role.is_instructor() {
            return Ok(Decision::allow("Privileged role can access all content"));
        }

        Ok(Decision::allow("Content access deferred to other policies"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::request;
    use crate::types::{Permission, Role};

    #[tokio::test]
    async fn test_never_denies() {
        for role in [Role::admin(), Role::instructor(), Role::student(), Role::new("guest")] {
            let req = request(role, "content", Permission::DOWNLOAD_CONTENT);
            assert!(ContentAccessPolicy.applies(&req));
            assert!(ContentAccessPolicy.evaluate(&req).await.unwrap().allow);
        }
    }

    #[test]
    fn test_applies_to_content_only() {
        let req = request(Role::student(), "lecture", Permission::VIEW_LECTURES);
        assert!(!ContentAccessPolicy.applies(&req));
    }
}
