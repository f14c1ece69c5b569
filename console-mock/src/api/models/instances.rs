//! API models for instances.

use super::pagination::HasId;
use crate::types::{InstanceId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_NCPUS: u16 = 64;
pub const MIN_MEMORY_BYTES: u64 = 1 << 30;
pub const MAX_MEMORY_BYTES: u64 = 256 << 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Instance {
    #[schema(value_type = String, format = "uuid")]
    pub id: InstanceId,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, format = "uuid")]
    pub project_id: ProjectId,
    pub hostname: String,
    pub ncpus: u16,
    /// Memory in bytes
    pub memory: u64,
    pub run_state: InstanceState,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
    pub time_run_state_updated: DateTime<Utc>,
}

impl HasId for Instance {
    fn id(&self) -> uuid::Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstanceCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub hostname: Option<String>,
    pub ncpus: u16,
    /// Memory in bytes
    pub memory: u64,
    /// Start the instance once created (default: true)
    #[serde(default = "default_start")]
    pub start: bool,
}

fn default_start() -> bool {
    true
}

/// Bytes read from an instance's serial console.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstanceSerialConsoleData {
    pub data: Vec<u8>,
    /// Offset of the last byte returned, counted from the start of the console history
    pub last_byte_offset: u64,
}
