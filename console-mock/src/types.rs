//! Common type definitions shared across the API, the store and authorization.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`UserId`], [`GroupId`]: identities that can hold roles
//! - [`ProjectId`], [`InstanceId`], [`DiskId`], [`FloatingIpId`], [`AffinityGroupId`]: project
//!   scoped resources
//! - [`IpPoolId`], [`SledId`]: fleet scoped resources
//!
//! # Authorization types
//!
//! [`ResourceType`] names the kind of resource a role assignment is attached to and
//! [`IdentityType`] says whether the holder is a user or a group.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

pub type UserId = Uuid;
pub type GroupId = Uuid;
pub type SiloId = Uuid;
pub type ProjectId = Uuid;
pub type InstanceId = Uuid;
pub type DiskId = Uuid;
pub type FloatingIpId = Uuid;
pub type AffinityGroupId = Uuid;
pub type IpPoolId = Uuid;
pub type SledId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Kind of resource a role can be granted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Fleet,
    Silo,
    Project,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Fleet => write!(f, "fleet"),
            ResourceType::Silo => write!(f, "silo"),
            ResourceType::Project => write!(f, "project"),
        }
    }
}

/// Whether a role assignment's identity is a single user or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
    SiloUser,
    SiloGroup,
}

/// Path or query selector that accepts either a resource name or its UUID.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NameOrId {
    Id(Uuid),
    Name(String),
}

impl NameOrId {
    pub fn matches(&self, id: Uuid, name: &str) -> bool {
        match self {
            NameOrId::Id(want) => *want == id,
            NameOrId::Name(want) => want == name,
        }
    }
}

impl fmt::Display for NameOrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameOrId::Id(id) => write!(f, "{id}"),
            NameOrId::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<&str> for NameOrId {
    fn from(s: &str) -> Self {
        match Uuid::parse_str(s) {
            Ok(id) => NameOrId::Id(id),
            Err(_) => NameOrId::Name(s.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_or_id_parsing() {
        let id = Uuid::new_v4();
        assert_eq!(NameOrId::from(id.to_string().as_str()), NameOrId::Id(id));
        assert_eq!(NameOrId::from("mock-project"), NameOrId::Name("mock-project".to_string()));
    }

    #[test]
    fn test_name_or_id_matches() {
        let id = Uuid::new_v4();
        assert!(NameOrId::Id(id).matches(id, "anything"));
        assert!(NameOrId::Name("db1".into()).matches(Uuid::new_v4(), "db1"));
        assert!(!NameOrId::Name("db1".into()).matches(id, "db2"));
    }

    #[test]
    fn test_resource_type_serialization() {
        assert_eq!(serde_json::to_value(ResourceType::Project).unwrap(), "project");
        assert_eq!(serde_json::to_value(IdentityType::SiloGroup).unwrap(), "silo_group");
    }
}
