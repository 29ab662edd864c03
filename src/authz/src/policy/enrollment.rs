use async_trait::async_trait;
use serde_json::Value;

use super::{str_attr, Policy};
use crate::engine::Decision;
use crate::error::Result;
use crate::types::{attr, AccessRequest, Permission};

const GATED_ACTIONS: [&str; 5] = [
    Permission::VIEW_LECTURES,
    Permission::VIEW_ASSIGNMENTS,
    Permission::VIEW_RESOURCES,
    Permission::DOWNLOAD_CONTENT,
    Permission::VIEW_INTERNSHIP,
];

/// Students may only consume material of internships they are enrolled in.
/// Missing or malformed enrollment data denies.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnrollmentBasedAccessPolicy;

#[async_trait]
impl Policy for EnrollmentBasedAccessPolicy {
    fn name(&self) -> &str {
        "enrollment_based_access"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn applies(&self, request: &AccessRequest) -> bool {
        request.subject.role.is_student() && GATED_ACTIONS.contains(&request.action.as_str())
    }

    async fn evaluate(&self, request: &AccessRequest) -> Result<Decision> {
        let Some(internship_id) = str_attr(&request.resource.attributes, attr::INTERNSHIP_ID) else {
            return Ok(Decision::deny("Resource is not associated with an internship"));
        };

        let Some(Value::Array(enrolled)) = request.subject.attributes.get(attr::ENROLLED_INTERNSHIPS)
        else {
            return Ok(Decision::deny("No enrollment information for user"));
        };

        if enrolled.iter().any(|id| id.as_str() == Some(internship_id)) {
            Ok(Decision::allow("User is enrolled in the internship")
                .with_metadata(attr::INTERNSHIP_ID, internship_id))
        } else {
            Ok(Decision::deny("User is not enrolled in this internship")
                .with_metadata(attr::INTERNSHIP_ID, internship_id))
        }
    }
}
