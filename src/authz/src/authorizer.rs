//! Single entry point combining RBAC and ABAC
//!
//! RBAC runs first and a denial there is final; only requests the role table
//! allows reach the policy engine. Callers must treat both `Ok(false)` and
//! `Err(_)` as "access denied".

use crate::engine::{EngineConfig, PolicyEngine};
use crate::error::{AuthzError, Result};
use crate::rbac::RoleRegistry;
use crate::types::{AccessRequest, Attributes, AuthContext, Permission, Resource};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// RBAC gate followed by ABAC evaluation
#[derive(Clone)]
pub struct UnifiedAuthorizer {
    registry: Arc<RoleRegistry>,
    engine: Arc<PolicyEngine>,
}

impl UnifiedAuthorizer {
    pub fn new(registry: Arc<RoleRegistry>, engine: Arc<PolicyEngine>) -> Self {
        Self { registry, engine }
    }

    /// Default role table and an engine with the built-in policies
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(RoleRegistry::default()),
            Arc::new(PolicyEngine::with_builtin_policies(EngineConfig::default())),
        )
    }

    pub fn registry(&self) -> &Arc<RoleRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    /// Authorize a request. Provider attributes merged during evaluation
    /// are left on `request`.
    pub async fn is_authorized(&self, request: &mut AccessRequest) -> Result<bool> {
        let subject = &request.subject;
        if !self.registry.has_permission(&subject.role, &request.action) {
            info!(
                user_id = %subject.user_id,
                role = %subject.role,
                action = %request.action,
                "Access denied by RBAC"
            );
            return Ok(false);
        }

        match self.engine.evaluate(request).await {
            Ok(allowed) => {
                debug!(
                    user_id = %request.subject.user_id,
                    action = %request.action,
                    allowed,
                    "Authorization complete"
                );
                Ok(allowed)
            }
            Err(e) => {
                error!(
                    user_id = %request.subject.user_id,
                    action = %request.action,
                    error = %e,
                    "ABAC evaluation failed, denying"
                );
                Err(e)
            }
        }
    }

    /// Start a fluent authorization check
    pub fn check(&self) -> AuthorizationBuilder<'_> {
        AuthorizationBuilder::new(self)
    }
}

/// Fluent construction of an [`AccessRequest`] for
/// [`UnifiedAuthorizer::is_authorized`]
pub struct AuthorizationBuilder<'a> {
    authorizer: &'a UnifiedAuthorizer,
    subject: Option<AuthContext>,
    resource: Option<Resource>,
    action: Option<Permission>,
    user_attributes: Attributes,
    resource_attributes: Attributes,
    context: Attributes,
}

impl<'a> AuthorizationBuilder<'a> {
    pub fn new(authorizer: &'a UnifiedAuthorizer) -> Self {
        Self {
            authorizer,
            subject: None,
            resource: None,
            action: None,
            user_attributes: Attributes::new(),
            resource_attributes: Attributes::new(),
            context: Attributes::new(),
        }
    }

    pub fn for_user(mut self, subject: AuthContext) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn on_resource(mut self, resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        self.resource = Some(Resource::new(resource_type, id));
        self
    }

    pub fn with_action(mut self, action: impl Into<Permission>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_user_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.user_attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_resource_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.resource_attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Assemble the request without evaluating it
    pub fn build(self) -> Result<AccessRequest> {
        let mut subject = self
            .subject
            .ok_or_else(|| AuthzError::InvalidInput("authorization check has no user".to_string()))?;
        let mut resource = self
            .resource
            .ok_or_else(|| AuthzError::InvalidInput("authorization check has no resource".to_string()))?;
        let action = self
            .action
            .ok_or_else(|| AuthzError::InvalidInput("authorization check has no action".to_string()))?;

        subject.attributes.extend(self.user_attributes);
        resource.attributes.extend(self.resource_attributes);

        Ok(AccessRequest {
            subject,
            resource,
            action,
            context: self.context,
        })
    }

    pub async fn check(self) -> Result<bool> {
        let authorizer = self.authorizer;
        let mut request = self.build()?;
        authorizer.is_authorized(&mut request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{attr, Role};
    use serde_json::json;

    #[test]
    fn test_builder_assembles_request() {
        let authorizer = UnifiedAuthorizer::with_defaults();

        let request = authorizer
            .check()
            .for_user(AuthContext::new("u1", Role::student()).with_attribute(attr::PROGRESS, 10.0))
            .on_resource("lecture", "l1")
            .with_action(Permission::VIEW_LECTURES)
            .with_user_attribute(attr::ENROLLED_INTERNSHIPS, json!(["i1"]))
            .with_resource_attribute(attr::INTERNSHIP_ID, "i1")
            .with_context("ip", "10.0.0.1")
            .build()
            .unwrap();

        assert_eq!(request.subject.attributes.len(), 2);
        assert_eq!(request.resource.attributes[attr::INTERNSHIP_ID], "i1");
        assert_eq!(request.action.as_str(), "lecture:view");
        assert_eq!(request.context["ip"], "10.0.0.1");
    }

    #[tokio::test]
    async fn test_builder_requires_all_parts() {
        let authorizer = UnifiedAuthorizer::with_defaults();

        let result = authorizer
            .check()
            .for_user(AuthContext::new("u1", Role::student()))
            .with_action(Permission::VIEW_LECTURES)
            .check()
            .await;

        assert!(matches!(result, Err(AuthzError::InvalidInput(_))));
    }
}
