//! OxQL result types and the helpers that turn query results into chart series.
//!
//! An OxQL query returns one or more tables. Every timeseries in a table shares the same
//! timestamp axis and carries one value per timestamp, where `null` marks a gap.
//!
//! - [`query`]: builds the query strings the console sends and parses the bits the mock needs
//! - [`shaping`]: sums a table into a single gap-preserving chart series
//! - [`charts`]: unit scaling and axis formatting for the bytes, count and utilization charts

pub mod charts;
pub mod query;
pub mod shaping;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub use charts::{ChartProps, bytes_chart, count_chart, format_count_tick, utilization_chart};
pub use query::{OxqlQuery, ParsedQuery, mean_within_seconds, parse_query};
pub use shaping::{compose_chart_data, sum_points};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Gauge,
    /// Each sample covers the interval since the previous one. The first sample of a series is
    /// the cumulative total up to that point.
    Delta,
    Cumulative,
}

/// Typed value column. Only doubles are produced by the mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ValueArray {
    Double(Vec<Option<f64>>),
}

impl ValueArray {
    pub fn as_slice(&self) -> &[Option<f64>] {
        match self {
            ValueArray::Double(values) => values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Values {
    pub values: ValueArray,
    pub metric_type: MetricType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Points {
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<Values>,
}

impl Points {
    /// The first value column, which is the only one the console charts.
    pub fn first_column(&self) -> &[Option<f64>] {
        self.values.first().map(|v| v.values.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Timeseries {
    /// Field values identifying the series, e.g. `{"disk_id": "…"}`
    #[schema(value_type = Object)]
    pub fields: BTreeMap<String, serde_json::Value>,
    pub points: Points,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Table {
    pub name: String,
    pub timeseries: Vec<Timeseries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OxqlQueryResult {
    pub tables: Vec<Table>,
}

/// One chart point. `None` is a gap in the line, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartDatum {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}
