//! # Campus Authorization Engine
//!
//! Two-layer authorization for the internship platform:
//!
//! - **RBAC**: a static role → permission table ([`RoleRegistry`]) checked first
//! - **ABAC**: pluggable attribute providers and policies ([`PolicyEngine`])
//!   for fine-grained, contextual rules (enrollment, ownership, access
//!   windows, progress gates)
//!
//! Both layers must allow. [`UnifiedAuthorizer`] is the single entry point.
//!
//! ## Example
//!
//! ```rust
//! use campus_authz::{attr, AuthContext, Permission, Role, UnifiedAuthorizer};
//!
//! # async fn example() -> campus_authz::Result<()> {
//! let authorizer = UnifiedAuthorizer::with_defaults();
//!
//! let allowed = authorizer
//!     .check()
//!     .for_user(AuthContext::new("u1", Role::student()))
//!     .on_resource("lecture", "l-42")
//!     .with_action(Permission::VIEW_LECTURES)
//!     .with_user_attribute(attr::ENROLLED_INTERNSHIPS, serde_json::json!(["i1"]))
//!     .with_resource_attribute(attr::INTERNSHIP_ID, "i1")
//!     .check()
//!     .await?;
//!
//! assert!(allowed);
//! # Ok(())
//! # }
//! ```

pub mod authorizer;
pub mod engine;
pub mod error;
pub mod policy;
pub mod provider;
pub mod rbac;
pub mod types;

pub use authorizer::{AuthorizationBuilder, UnifiedAuthorizer};
pub use engine::{
    AllMustAllow, AnyCanAllow, CacheStats, Decision, Effect, EngineConfig, EngineMetrics,
    PolicyCombiner, PolicyEngine, PriorityBased,
};
pub use error::{AuthzError, Result};
pub use policy::Policy;
pub use provider::{AttributeProvider, StaticAttributeProvider};
pub use rbac::RoleRegistry;
pub use types::{attr, AccessRequest, Attributes, AuthContext, Permission, Resource, Role};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
