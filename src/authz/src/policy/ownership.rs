use async_trait::async_trait;

use super::Policy;
use crate::engine::Decision;
use crate::error::Result;
use crate::types::{attr, AccessRequest, Permission};

/// Only the creator of an internship (or an admin) may modify or delete it.
///
/// A resource without `created_by` is allowed through, unlike the
/// enrollment policy which denies on missing data.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnershipPolicy;

#[async_trait]
impl Policy for OwnershipPolicy {
    fn name(&self) -> &str {
        "ownership"
    }

    fn priority(&self) -> i32 {
        200
    }

    fn applies(&self, request: &AccessRequest) -> bool {
        [Permission::UPDATE_INTERNSHIP, Permission::DELETE_INTERNSHIP]
            .contains(&request.action.as_str())
    }

    async fn evaluate(&self, request: &AccessRequest) -> Result<Decision> {
        if request.subject.role.is_admin() {
            return Ok(Decision::allow("Admin can modify any resource"));
        }

        let Some(created_by) = request.resource.attributes.get(attr::CREATED_BY) else {
            return Ok(Decision::allow("No ownership information for resource"));
        };

        if created_by.as_str() == Some(request.subject.user_id.as_str()) {
            Ok(Decision::allow("User owns the resource"))
        } else {
            Ok(Decision::deny("User does not own the resource")
                .with_metadata(attr::CREATED_BY, created_by.clone()))
        }
    }
}
