//! API models for role assignments and policies.

use crate::types::{IdentityType, ResourceType};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Built-in roles, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleKey {
    Admin,
    Collaborator,
    Viewer,
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKey::Admin => write!(f, "admin"),
            RoleKey::Collaborator => write!(f, "collaborator"),
            RoleKey::Viewer => write!(f, "viewer"),
        }
    }
}

/// One row of the role assignment table: `(resource_type, resource_id, identity_id) -> role`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub resource_type: ResourceType,
    pub resource_id: Uuid,
    pub identity_id: Uuid,
    pub identity_type: IdentityType,
    pub role_name: RoleKey,
}

/// A role assignment as it appears inside a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PolicyRoleAssignment {
    #[schema(value_type = String, format = "uuid")]
    pub identity_id: Uuid,
    pub identity_type: IdentityType,
    pub role_name: RoleKey,
}

/// All role assignments on a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Policy {
    pub role_assignments: Vec<PolicyRoleAssignment>,
}
