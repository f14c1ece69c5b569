//! Building and (minimally) parsing OxQL query strings.
//!
//! The console asks for every chart with a query of the form
//!
//! ```text
//! get virtual_disk:bytes_read
//!   | filter timestamp >= @2025-01-01T00:00:00.000 && timestamp < @2025-01-02T00:00:00.000 && disk_id == "…"
//!   | align mean_within(1440s)
//!   | group_by [], sum
//! ```
//!
//! The mock does not implement OxQL. It pulls the metric name and an optional CPU `state` filter
//! out of the string and synthesizes a result from those.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::errors::{Error, Result};

/// Number of points a chart aims to show across its window.
pub const DEFAULT_DATAPOINTS: i64 = 60;

/// The shortest alignment window, in seconds.
const MIN_WINDOW_SECS: i64 = 60;

static METRIC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\S+\s+(\S+)").expect("metric name regex is valid"));
static STATE_FILTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"state\s*==\s*"([a-z_]+)""#).expect("state filter regex is valid"));

/// Alignment window for a chart spanning `start..end`: the window that yields about
/// `datapoints` points, never shorter than a minute.
pub fn mean_within_seconds(start: DateTime<Utc>, end: DateTime<Utc>, datapoints: i64) -> i64 {
    let duration = (end - start).num_seconds().max(0) as f64;
    let per_point = (duration / datapoints.max(1) as f64).round() as i64;
    per_point.max(MIN_WINDOW_SECS)
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Parameters of a chart query.
#[derive(Debug, Clone)]
pub struct OxqlQuery {
    pub metric_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `key == "value"` filters, rendered in key order
    pub eq_filters: BTreeMap<String, String>,
    /// Sum all matching timeseries into one
    pub group: bool,
}

impl OxqlQuery {
    pub fn new(metric_name: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            metric_name: metric_name.into(),
            start_time,
            end_time,
            eq_filters: BTreeMap::new(),
            group: true,
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq_filters.insert(key.into(), value.into());
        self
    }

    /// Alignment window in seconds.
    pub fn window_secs(&self) -> i64 {
        mean_within_seconds(self.start_time, self.end_time, DEFAULT_DATAPOINTS)
    }

    /// Start of the range actually queried: two windows before the requested start, so that
    /// dropping the first (cumulative) point still leaves the requested start covered.
    pub fn query_start(&self) -> Result<DateTime<Utc>> {
        self.start_time
            .checked_sub_signed(Duration::seconds(2 * self.window_secs()))
            .ok_or_else(|| Error::invalid_request("time window out of range"))
    }

    /// Render the query string.
    pub fn render(&self) -> Result<String> {
        let mut filters = vec![
            format!("timestamp >= @{}", format_timestamp(self.query_start()?)),
            format!("timestamp < @{}", format_timestamp(self.end_time)),
        ];
        filters.extend(self.eq_filters.iter().map(|(k, v)| format!("{k} == \"{v}\"")));

        let mut query = format!(
            "get {} | filter {} | align mean_within({}s)",
            self.metric_name,
            filters.join(" && "),
            self.window_secs()
        );
        if self.group {
            query.push_str(" | group_by [], sum");
        }
        Ok(query)
    }
}

/// The parts of a query string the mock looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub metric_name: String,
    /// CPU state from a `state == "…"` filter, if any
    pub state: Option<String>,
}

/// Extract the metric name (second whitespace-delimited token) and an optional state filter.
pub fn parse_query(query: &str) -> Result<ParsedQuery> {
    let metric_name = METRIC_NAME
        .captures(query)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::invalid_request(format!("could not find a metric name in query: {query}")))?;

    let state = STATE_FILTER
        .captures(query)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    Ok(ParsedQuery { metric_name, state })
}
