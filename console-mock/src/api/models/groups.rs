//! API models for silo groups.

use super::pagination::HasId;
use crate::types::{GroupId, SiloId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Group {
    #[schema(value_type = String, format = "uuid")]
    pub id: GroupId,
    pub display_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub silo_id: SiloId,
}

impl HasId for Group {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

/// Association between a user and a group. Only kept in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub user_id: UserId,
    pub group_id: GroupId,
}
