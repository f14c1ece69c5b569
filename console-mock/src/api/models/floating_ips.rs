//! API models for floating IPs.

use super::pagination::HasId;
use crate::types::{FloatingIpId, InstanceId, IpPoolId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FloatingIp {
    #[schema(value_type = String, format = "uuid")]
    pub id: FloatingIpId,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    #[schema(value_type = String)]
    pub ip: IpAddr,
    #[schema(value_type = String, format = "uuid")]
    pub ip_pool_id: IpPoolId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub instance_id: Option<InstanceId>,
    pub time_created: DateTime<Utc>,
}

impl HasId for FloatingIp {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FloatingIpCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Specific address to reserve. Must fall inside the pool's ranges.
    pub ip: Option<String>,
    /// Pool to allocate from, the silo's default pool when absent
    pub pool: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FloatingIpAttach {
    /// Name or id of the instance
    pub instance: String,
}
