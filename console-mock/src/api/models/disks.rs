//! API models for disks.

use super::pagination::HasId;
use crate::types::{DiskId, InstanceId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const GIB: u64 = 1 << 30;
pub const MIN_DISK_SIZE_GIB: u64 = 1;
pub const MAX_DISK_SIZE_GIB: u64 = 1023;
pub const BLOCK_SIZES: [u32; 3] = [512, 2048, 4096];

/// Attachment state of a disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiskState {
    Detached,
    Attached {
        #[schema(value_type = String, format = "uuid")]
        instance: InstanceId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Disk {
    #[schema(value_type = String, format = "uuid")]
    pub id: DiskId,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    /// Size in bytes
    pub size: u64,
    pub block_size: u32,
    pub state: DiskState,
    pub device_path: String,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

impl HasId for Disk {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiskCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Size in bytes
    pub size: u64,
    #[serde(default = "default_block_size")]
    pub block_size: u32,
}

fn default_block_size() -> u32 {
    4096
}
