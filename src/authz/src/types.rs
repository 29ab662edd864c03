//! Core authorization types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Open attribute bag shared by subjects, resources and request context
pub type Attributes = HashMap<String, Value>;

/// Well-known attribute keys read by the built-in policies
pub mod attr {
    /// Subject: list of internship ids the student is enrolled in
    pub const ENROLLED_INTERNSHIPS: &str = "enrolled_internships";
    /// Subject: completion percentage
    pub const PROGRESS: &str = "progress";
    /// Resource: owning internship id
    pub const INTERNSHIP_ID: &str = "internship_id";
    /// Resource: user id of the creator
    pub const CREATED_BY: &str = "created_by";
    /// Resource: start of the access window
    pub const ACCESS_START_TIME: &str = "access_start_time";
    /// Resource: end of the access window
    pub const ACCESS_END_TIME: &str = "access_end_time";
    /// Resource: minimum completion percentage required
    pub const REQUIRED_PROGRESS: &str = "required_progress";
}

/// Permission identifier for an action (e.g. `internship:update`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    pub const VIEW_INTERNSHIP: &'static str = "internship:view";
    pub const CREATE_INTERNSHIP: &'static str = "internship:create";
    pub const UPDATE_INTERNSHIP: &'static str = "internship:update";
    pub const DELETE_INTERNSHIP: &'static str = "internship:delete";
    pub const VIEW_LECTURES: &'static str = "lecture:view";
    pub const VIEW_ASSIGNMENTS: &'static str = "assignment:view";
    pub const VIEW_RESOURCES: &'static str = "resource:view";
    pub const DOWNLOAD_CONTENT: &'static str = "content:download";
    pub const MANAGE_CONTENT: &'static str = "content:manage";
    pub const ENROLL: &'static str = "enrollment:create";
    pub const MANAGE_USERS: &'static str = "user:manage";
    pub const VIEW_PAYMENTS: &'static str = "payment:view";

    /// Create a permission from any string
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Permission {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Subject class. The platform defines a closed set; the engine compares
/// roles as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const INSTRUCTOR: &'static str = "instructor";
    pub const STUDENT: &'static str = "student";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    pub fn instructor() -> Self {
        Self::new(Self::INSTRUCTOR)
    }

    pub fn student() -> Self {
        Self::new(Self::STUDENT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    pub fn is_instructor(&self) -> bool {
        self.0 == Self::INSTRUCTOR
    }

    pub fn is_student(&self) -> bool {
        self.0 == Self::STUDENT
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Authenticated subject making the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    pub role: Role,

    /// Dynamic attributes, filled by the caller and by attribute providers
    #[serde(default)]
    pub attributes: Attributes,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, role: impl Into<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            email: String::new(),
            phone: String::new(),
            role: role.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    /// Add an attribute to the subject
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Resource being accessed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource type (internship, lecture, content, ...)
    #[serde(rename = "type")]
    pub resource_type: String,

    pub id: String,

    #[serde(default)]
    pub attributes: Attributes,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Add an attribute to the resource
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Unit of evaluation, built fresh for every authorization check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub subject: AuthContext,
    pub resource: Resource,
    pub action: Permission,

    /// Environment context (client ip, request time, ...)
    #[serde(default)]
    pub context: Attributes,
}

impl AccessRequest {
    pub fn new(subject: AuthContext, resource: Resource, action: impl Into<Permission>) -> Self {
        Self {
            subject,
            resource,
            action: action.into(),
            context: Attributes::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}
