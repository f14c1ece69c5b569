//! Fleet utilization series for the system metrics endpoint.
//!
//! The walk is seeded from the window start and the metric name, so identical requests trace the
//! same shape. The final scale factor is drawn from the thread RNG and therefore differs between
//! calls: only the shape is reproducible, not the magnitude.

use chrono::{DateTime, Duration, Utc};
use rand::prelude::RngExt;
use rand::rng;

use super::lcg::{Lcg, name_checksum};
use crate::api::models::hardware::{PhysicalDisk, Sled};
use crate::api::models::metrics::SystemMetricName;
use crate::errors::{Error, Result};

/// Portions of the series (as fractions of its length) where usage climbs.
const GROWTH_WINDOWS: [(f64, f64); 2] = [(0.2, 0.35), (0.6, 0.75)];

/// Total provisionable capacity of the rack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClusterCapacity {
    pub hardware_threads: u64,
    pub physical_memory_bytes: u64,
    pub disk_bytes: u64,
}

impl ClusterCapacity {
    pub fn from_inventory(sleds: &[Sled], disks: &[PhysicalDisk]) -> Self {
        Self {
            hardware_threads: sleds.iter().map(|s| u64::from(s.usable_hardware_threads)).sum(),
            physical_memory_bytes: sleds.iter().map(|s| s.usable_physical_ram).sum(),
            disk_bytes: disks.iter().map(|d| d.size_bytes).sum(),
        }
    }

    /// Ceiling for the given metric.
    pub fn for_metric(&self, metric: SystemMetricName) -> f64 {
        match metric {
            SystemMetricName::CpusProvisioned => self.hardware_threads as f64,
            SystemMetricName::RamProvisioned => self.physical_memory_bytes as f64,
            SystemMetricName::VirtualDiskSpaceProvisioned => self.disk_bytes as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

fn in_growth_window(position: f64) -> bool {
    GROWTH_WINDOWS.iter().any(|(from, to)| (*from..*to).contains(&position))
}

/// Generate `points` samples of `metric` spread evenly over `start..end`.
///
/// `start` is pulled forward so that no more than `max_history` is ever generated. Values stay
/// within `[0, capacity]`; CPU counts are whole numbers. Windows whose history floor falls before
/// the earliest representable date are rejected.
pub fn generate_utilization(
    metric: SystemMetricName,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    capacity: &ClusterCapacity,
    points: usize,
    max_history: Duration,
) -> Result<Vec<UtilizationSample>> {
    let floor = end
        .checked_sub_signed(max_history)
        .ok_or_else(|| Error::invalid_request("time window out of range"))?;
    let start = start.max(floor);
    if end <= start || points == 0 {
        return Ok(Vec::new());
    }
    let count = i32::try_from(points).map_err(|_| Error::internal("system_metric_points is out of range"))?;

    let cap = capacity.for_metric(metric);
    let seed = (start.timestamp().max(0) as u64).wrapping_add(name_checksum(metric.as_str()));
    let mut lcg = Lcg::new(seed);

    let mut value = cap * 0.1;
    let mut walk = Vec::with_capacity(points);
    for i in 0..points {
        let r = lcg.next_f64();
        let delta = if in_growth_window(i as f64 / points as f64) {
            (r - 0.25) * cap * 0.04
        } else {
            (r - 0.5) * cap * 0.004
        };
        value = (value + delta).clamp(0.0, cap);
        walk.push(value);
    }

    let observed_max = walk.iter().copied().fold(0.0, f64::max);
    let scale: f64 = rng().random_range(0.33..1.0);

    let step = (end - start) / count;
    Ok((0..count)
        .zip(walk)
        .map(|(i, v)| {
            let normalized = if observed_max > 0.0 { v / observed_max } else { 0.0 };
            let mut value = normalized * cap * scale;
            if metric == SystemMetricName::CpusProvisioned {
                value = value.floor();
            }
            UtilizationSample {
                timestamp: start + step * i,
                value,
            }
        })
        .collect())
}
