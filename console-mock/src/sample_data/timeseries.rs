//! Canned OxQL tables for the instance and disk metrics charts.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::collections::BTreeMap;

use super::lcg::{Lcg, name_checksum};
use crate::errors::{Error, Result};
use crate::oxql::{MetricType, OxqlQueryResult, ParsedQuery, Points, Table, Timeseries, ValueArray, Values};

/// Chance that any point after the first is missing.
const GAP_PROBABILITY: f64 = 0.03;

/// The first sample of a delta series carries the total since the series began; this is how many
/// intervals it pretends to cover.
const CUMULATIVE_INTERVALS: f64 = 240.0;

/// Number of vCPUs reported for every instance.
const VCPUS: usize = 4;

/// Shape of a known metric.
struct MetricProfile {
    /// Typical value per second of the alignment interval, per timeseries
    per_second: f64,
    /// Field that tells timeseries apart
    key: &'static str,
    series: usize,
    /// `per_second` is a hard ceiling rather than a typical rate
    saturates: bool,
}

fn profile(metric_name: &str) -> Option<MetricProfile> {
    let (per_second, key, series) = match metric_name {
        "virtual_disk:bytes_read" => (4.0 * 1024.0 * 1024.0, "disk_id", 2),
        "virtual_disk:bytes_written" => (2.5 * 1024.0 * 1024.0, "disk_id", 2),
        "virtual_disk:reads" => (180.0, "disk_id", 2),
        "virtual_disk:writes" => (95.0, "disk_id", 2),
        "virtual_disk:flushes" => (3.0, "disk_id", 2),
        "instance_network_interface:bytes_sent" => (600.0 * 1024.0, "interface_id", 1),
        "instance_network_interface:bytes_received" => (1.2 * 1024.0 * 1024.0, "interface_id", 1),
        "instance_network_interface:packets_sent" => (450.0, "interface_id", 1),
        "instance_network_interface:packets_received" => (800.0, "interface_id", 1),
        // Busy nanoseconds per second of wall time, for one fully busy vCPU
        "virtual_machine:vcpu_usage" => (1e9, "vcpu_id", VCPUS),
        _ => return None,
    };
    Some(MetricProfile {
        per_second,
        key,
        series,
        saturates: metric_name == "virtual_machine:vcpu_usage",
    })
}

/// Share of a vCPU's time spent in `state`. Without a state filter the states add up to the whole.
fn state_share(state: Option<&str>) -> Result<f64> {
    Ok(match state {
        None => 1.0,
        Some("run") => 0.45,
        Some("idle") => 0.4,
        Some("waiting") => 0.1,
        Some("emulation") => 0.05,
        Some(other) => return Err(Error::invalid_request(format!("unknown vcpu state: {other}"))),
    })
}

/// Build one delta table for `query` covering `start..end` at `step` resolution.
///
/// Output depends only on the inputs. Unknown metrics are reported as not implemented.
pub fn mock_table(query: &ParsedQuery, start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Result<Table> {
    let profile = profile(&query.metric_name)
        .ok_or_else(|| Error::not_implemented(format!("no mock data for metric {}", query.metric_name)))?;
    let share = state_share(query.state.as_deref())?;

    let step_secs = step.num_seconds();
    if step_secs <= 0 {
        return Err(Error::invalid_request("alignment interval must be at least one second"));
    }
    let span = (end - start).num_seconds();
    if span <= 0 {
        return Err(Error::invalid_request("end time must be after start time"));
    }
    let points = i32::try_from((span + step_secs - 1) / step_secs)
        .map_err(|_| Error::invalid_request("too many points in time window"))?;
    let timestamps: Vec<DateTime<Utc>> = (0..points).map(|i| start + step * i).collect();

    let mut seed = (start.timestamp().max(0) as u64).wrapping_add(name_checksum(&query.metric_name));
    if let Some(state) = &query.state {
        seed = seed.wrapping_add(name_checksum(state));
    }
    let mut lcg = Lcg::new(seed);

    let mean = profile.per_second * step_secs as f64 * share;
    let timeseries = (0..profile.series)
        .map(|series| {
            let values: Vec<Option<f64>> = (0..timestamps.len())
                .map(|i| {
                    let jitter = if profile.saturates {
                        1.0 - 0.5 * lcg.next_f64()
                    } else {
                        0.5 + lcg.next_f64()
                    };
                    let gap = lcg.next_f64() < GAP_PROBABILITY;
                    if i == 0 {
                        Some((mean * jitter * CUMULATIVE_INTERVALS).round())
                    } else if gap {
                        None
                    } else {
                        Some((mean * jitter).round())
                    }
                })
                .collect();

            let mut fields = BTreeMap::new();
            fields.insert(profile.key.to_string(), json!(series));
            if let Some(state) = &query.state {
                fields.insert("state".to_string(), json!(state));
            }

            Timeseries {
                fields,
                points: Points {
                    timestamps: timestamps.clone(),
                    values: vec![Values {
                        values: ValueArray::Double(values),
                        metric_type: MetricType::Delta,
                    }],
                },
            }
        })
        .collect();

    Ok(Table {
        name: query.metric_name.clone(),
        timeseries,
    })
}

/// Wrap [`mock_table`] in a query result.
pub fn mock_query_result(
    query: &ParsedQuery,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
) -> Result<OxqlQueryResult> {
    Ok(OxqlQueryResult {
        tables: vec![mock_table(query, start, end, step)?],
    })
}
