//! API models for rack hardware.

use super::pagination::HasId;
use crate::types::SledId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Sled {
    #[schema(value_type = String, format = "uuid")]
    pub id: SledId,
    pub serial: String,
    pub usable_hardware_threads: u32,
    /// Bytes
    pub usable_physical_ram: u64,
}

impl HasId for Sled {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// A physical disk installed in a sled. Only kept in the store to size the cluster.
#[derive(Debug, Clone)]
pub struct PhysicalDisk {
    pub id: Uuid,
    pub sled_id: SledId,
    pub size_bytes: u64,
}
