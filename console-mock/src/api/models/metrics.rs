//! API models for the system utilization metrics endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::{IntoParams, ToSchema};

/// Fleet-wide provisioning metrics the console charts on the utilization page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SystemMetricName {
    CpusProvisioned,
    RamProvisioned,
    VirtualDiskSpaceProvisioned,
}

impl SystemMetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemMetricName::CpusProvisioned => "cpus_provisioned",
            SystemMetricName::RamProvisioned => "ram_provisioned",
            SystemMetricName::VirtualDiskSpaceProvisioned => "virtual_disk_space_provisioned",
        }
    }
}

impl fmt::Display for SystemMetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaginationOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct SystemMetricsQuery {
    /// Inclusive start of the window (default: 24 hours before `end_time`)
    pub start_time: Option<DateTime<Utc>>,
    /// Exclusive end of the window (default: now)
    pub end_time: Option<DateTime<Utc>>,
    pub order: Option<PaginationOrder>,
    /// Maximum number of measurements to return
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "datum", rename_all = "snake_case")]
pub enum Datum {
    I64(i64),
    F64(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub datum: Datum,
}
