//! API models for IP pools.

use super::pagination::HasId;
use crate::net::IpRange;
use crate::types::IpPoolId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IpPool {
    #[schema(value_type = String, format = "uuid")]
    pub id: IpPoolId,
    pub name: String,
    pub description: String,
    /// Pool used by the silo when a request names none
    pub is_default: bool,
    pub time_created: DateTime<Utc>,
}

impl HasId for IpPool {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IpPoolRange {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub ip_pool_id: IpPoolId,
    pub range: IpRange,
    pub time_created: DateTime<Utc>,
}

impl HasId for IpPoolRange {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ipv4Utilization {
    pub allocated: u32,
    pub capacity: u32,
}

/// IPv6 figures do not fit in a JSON number, so they travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ipv6Utilization {
    pub allocated: String,
    pub capacity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IpPoolUtilization {
    pub ipv4: Ipv4Utilization,
    pub ipv6: Ipv6Utilization,
}
