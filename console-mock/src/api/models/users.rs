//! API models for users and the acting identity.

use super::pagination::{HasId, PaginationParams};
use crate::types::{GroupId, SiloId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A user of the silo.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub display_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub silo_id: SiloId,
    pub time_created: DateTime<Utc>,
}

impl HasId for User {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

/// The identity a request acts as, resolved from the user cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub display_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub silo_id: SiloId,
    pub silo_name: String,
    /// Whether the user holds the fleet viewer role, which gates the system views of the console
    pub fleet_viewer: bool,
}

/// Query for listing users, optionally only the members of one group.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserListQuery {
    /// Only list members of this group (UUID)
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub group: Option<GroupId>,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: PaginationParams,
}
