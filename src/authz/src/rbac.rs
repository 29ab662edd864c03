//! Static role-based access control
//!
//! The role table is supplied once at construction and indexed into per-role
//! permission sets, so steady-state checks are two hash probes under an
//! uncontended read lock and never allocate.

use crate::types::{Permission, Role};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Immutable role → permission registry
pub struct RoleRegistry {
    role_permissions: HashMap<Role, Vec<Permission>>,

    /// Per-role grant sets
    lookup: RwLock<HashMap<Role, HashSet<Permission>>>,
}

impl RoleRegistry {
    /// Build a registry and eagerly materialize the lookup cache
    pub fn new(role_permissions: HashMap<Role, Vec<Permission>>) -> Self {
        let lookup: HashMap<Role, HashSet<Permission>> = role_permissions
            .iter()
            .map(|(role, permissions)| (role.clone(), permissions.iter().cloned().collect()))
            .collect();

        info!(
            roles = role_permissions.len(),
            grants = lookup.values().map(HashSet::len).sum::<usize>(),
            "Role registry initialized"
        );

        Self {
            role_permissions,
            lookup: RwLock::new(lookup),
        }
    }

    /// Check whether `role` grants `permission`. Unknown roles or
    /// permissions are simply not granted.
    pub fn has_permission(&self, role: &Role, permission: &Permission) -> bool {
        let granted = self
            .lookup
            .read()
            .get(role)
            .is_some_and(|permissions| permissions.contains(permission));

        debug!(role = %role, permission = %permission, granted, "RBAC check");
        granted
    }

    /// Permissions granted to a role (empty for unknown roles)
    pub fn user_permissions(&self, role: &Role) -> Vec<Permission> {
        self.role_permissions.get(role).cloned().unwrap_or_default()
    }

    /// All configured roles, sorted
    pub fn all_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.role_permissions.keys().cloned().collect();
        roles.sort();
        roles
    }

    /// Copy of the full role table
    pub fn role_permissions(&self) -> HashMap<Role, Vec<Permission>> {
        self.role_permissions.clone()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new(default_role_permissions())
    }
}

/// Platform role table: admins hold every permission, instructors manage
/// internships and content, students only consume.
pub fn default_role_permissions() -> HashMap<Role, Vec<Permission>> {
    let admin = [
        Permission::VIEW_INTERNSHIP,
        Permission::CREATE_INTERNSHIP,
        Permission::UPDATE_INTERNSHIP,
        Permission::DELETE_INTERNSHIP,
        Permission::VIEW_LECTURES,
        Permission::VIEW_ASSIGNMENTS,
        Permission::VIEW_RESOURCES,
        Permission::DOWNLOAD_CONTENT,
        Permission::MANAGE_CONTENT,
        Permission::ENROLL,
        Permission::MANAGE_USERS,
        Permission::VIEW_PAYMENTS,
    ];
    let instructor = [
        Permission::VIEW_INTERNSHIP,
        Permission::CREATE_INTERNSHIP,
        Permission::UPDATE_INTERNSHIP,
        Permission::DELETE_INTERNSHIP,
        Permission::VIEW_LECTURES,
        Permission::VIEW_ASSIGNMENTS,
        Permission::VIEW_RESOURCES,
        Permission::DOWNLOAD_CONTENT,
        Permission::MANAGE_CONTENT,
    ];
    let student = [
        Permission::VIEW_INTERNSHIP,
        Permission::VIEW_LECTURES,
        Permission::VIEW_ASSIGNMENTS,
        Permission::VIEW_RESOURCES,
        Permission::DOWNLOAD_CONTENT,
        Permission::ENROLL,
    ];

    HashMap::from([
        (Role::admin(), permissions(&admin)),
        (Role::instructor(), permissions(&instructor)),
        (Role::student(), permissions(&student)),
    ])
}

fn permissions(names: &[&str]) -> Vec<Permission> {
    names.iter().map(|name| Permission::new(*name)).collect()
}
