//! API models for anti-affinity/affinity groups.

use super::pagination::HasId;
use crate::types::{AffinityGroupId, InstanceId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the scheduler does when the group's constraint cannot be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AffinityPolicy {
    Allow,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AffinityGroup {
    #[schema(value_type = String, format = "uuid")]
    pub id: AffinityGroupId,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    pub policy: AffinityPolicy,
    pub time_created: DateTime<Utc>,
}

impl HasId for AffinityGroup {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AffinityGroupCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub policy: AffinityPolicy,
}

/// Store row linking an instance to an affinity group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityGroupMember {
    pub group_id: AffinityGroupId,
    pub instance_id: InstanceId,
}

/// Member as listed by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AffinityGroupMemberResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: InstanceId,
    pub name: String,
    pub run_state: super::instances::InstanceState,
}

impl HasId for AffinityGroupMemberResponse {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AffinityGroupMemberAdd {
    /// Name or id of the instance to add
    pub instance: String,
}
