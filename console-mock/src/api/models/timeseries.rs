//! API models for OxQL timeseries queries and chart shaping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::oxql::ChartDatum;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeseriesQuery {
    /// OxQL query string, e.g. `get virtual_disk:bytes_read | filter ...`
    pub query: String,
}

/// How a chart presents its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChartFlavor {
    /// Scaled to the largest fitting power-of-1024 unit
    Bytes,
    /// Raw counts with k/M/B/T axis labels
    Count,
    /// CPU busy time expressed as a percentage of available cores
    Utilization,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartRequest {
    #[schema(example = "virtual_disk:bytes_read")]
    pub metric_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub flavor: ChartFlavor,
    /// Core count for utilization charts
    #[serde(default)]
    pub cores: Option<u32>,
    /// Equality filters added to the query, e.g. `{"instance_id": "…", "state": "run"}`
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartResponse {
    /// The OxQL query that produced the data
    pub query: String,
    /// Unit label for the y axis
    pub unit: String,
    pub data: Vec<ChartDatum>,
    /// Formatted y axis tick labels, bottom to top
    pub tick_labels: Vec<String>,
}
