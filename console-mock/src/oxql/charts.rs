//! Unit scaling and axis labels for the three chart flavors the console draws.

use super::ChartDatum;
use super::shaping::largest_value;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const BYTE_UNITS: [&str; 5] = ["Bytes", "KiB", "MiB", "GiB", "TiB"];
const COUNT_SUFFIXES: [&str; 5] = ["", "k", "M", "B", "T"];
const TICK_COUNT: usize = 5;

/// Chart data after flavor-specific post-processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartProps {
    pub data: Vec<ChartDatum>,
    pub unit: String,
    pub tick_labels: Vec<String>,
}

/// Pick the power-of-1024 unit that keeps the largest value under 1024.
///
/// Returns the divisor and the unit label. Values under 1 KiB, and empty series, stay in bytes.
pub fn bytes_unit(largest: f64) -> (f64, &'static str) {
    let mut power = 0;
    while power < BYTE_UNITS.len() - 1 && largest >= 1024f64.powi(power as i32 + 1) {
        power += 1;
    }
    (1024f64.powi(power as i32), BYTE_UNITS[power])
}

pub fn bytes_chart(data: Vec<ChartDatum>) -> ChartProps {
    let largest = largest_value(&data).unwrap_or(0.0);
    let (divisor, unit) = bytes_unit(largest);
    let data: Vec<ChartDatum> = data
        .into_iter()
        .map(|d| ChartDatum {
            value: d.value.map(|v| v / divisor),
            ..d
        })
        .collect();
    let scaled_max = largest / divisor;

    ChartProps {
        data,
        unit: unit.to_string(),
        tick_labels: ticks(scaled_max).into_iter().map(format_plain).collect(),
    }
}

/// Counts are charted as-is; only the axis labels are abbreviated.
pub fn count_chart(data: Vec<ChartDatum>) -> ChartProps {
    let largest = largest_value(&data).unwrap_or(0.0);
    ChartProps {
        data,
        unit: "Count".to_string(),
        tick_labels: ticks(largest).into_iter().map(format_count_tick).collect(),
    }
}

/// Convert CPU busy nanoseconds per alignment window into percent of `cores`.
///
/// With no cores there is nothing to divide by, so the chart is empty.
pub fn utilization_chart(data: Vec<ChartDatum>, interval_secs: i64, cores: u32) -> ChartProps {
    if cores == 0 || interval_secs <= 0 {
        return ChartProps {
            data: Vec::new(),
            unit: "%".to_string(),
            tick_labels: Vec::new(),
        };
    }

    let denominator = interval_secs as f64 * 1e9 * f64::from(cores);
    let data: Vec<ChartDatum> = data
        .into_iter()
        .map(|d| ChartDatum {
            value: d.value.map(|v| v / denominator * 100.0),
            ..d
        })
        .collect();

    // Percentages are drawn against a fixed 0-100 axis unless usage overshoots
    let top = largest_value(&data).unwrap_or(0.0).max(100.0);
    ChartProps {
        data,
        unit: "%".to_string(),
        tick_labels: ticks(top).into_iter().map(|t| format!("{}%", format_plain(t))).collect(),
    }
}

fn ticks(max: f64) -> Vec<f64> {
    if max <= 0.0 || !max.is_finite() {
        return vec![0.0];
    }
    (0..TICK_COUNT).map(|i| max * i as f64 / (TICK_COUNT - 1) as f64).collect()
}

/// Round to at most three significant digits and drop trailing zeros.
fn round_sig3(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs().log10().floor() as i32;
    let decimals = (2 - magnitude).max(0) as usize;
    let s = format!("{n:.decimals$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

fn format_plain(n: f64) -> String {
    round_sig3(n)
}

/// Axis label for a count: power-of-1000 suffix with at most three significant digits.
///
/// `950` → `"950"`, `1500` → `"1.5k"`, `2_000_000` → `"2M"`, `123_456` → `"123k"`.
pub fn format_count_tick(n: f64) -> String {
    let abs = n.abs();
    if abs < 1000.0 {
        return round_sig3(n);
    }

    let mut power = ((abs.log10() / 3.0).floor() as usize).min(COUNT_SUFFIXES.len() - 1);
    let mut scaled = n / 1000f64.powi(power as i32);
    // 999_950 rounds to "1000k"; move up a unit instead
    if round_sig3(scaled.abs()).parse::<f64>().unwrap_or(0.0) >= 1000.0 && power < COUNT_SUFFIXES.len() - 1 {
        power += 1;
        scaled = n / 1000f64.powi(power as i32);
    }
    format!("{}{}", round_sig3(scaled), COUNT_SUFFIXES[power])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn data(values: &[Option<f64>]) -> Vec<ChartDatum> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ChartDatum {
                timestamp: start + Duration::minutes(i as i64),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn test_bytes_unit_selection() {
        assert_eq!(bytes_unit(0.0), (1.0, "Bytes"));
        assert_eq!(bytes_unit(1023.0), (1.0, "Bytes"));
        assert_eq!(bytes_unit(1024.0), (1024.0, "KiB"));
        assert_eq!(bytes_unit(2_000_000.0), (1024f64.powi(2), "MiB"));
        assert_eq!(bytes_unit(5.0 * 1024f64.powi(3)), (1024f64.powi(3), "GiB"));
        // Anything beyond TiB stays in TiB
        assert_eq!(bytes_unit(1024f64.powi(6)), (1024f64.powi(4), "TiB"));
    }

    #[test]
    fn test_bytes_chart_scales_and_keeps_gaps() {
        let props = bytes_chart(data(&[Some(2_000_000.0), None, Some(1_048_576.0)]));
        assert_eq!(props.unit, "MiB");
        let scaled = props.data[0].value.unwrap();
        assert!((scaled - 1.907).abs() < 0.001);
        assert_eq!(props.data[1].value, None);
        assert_eq!(props.data[2].value, Some(1.0));
        assert_eq!(props.tick_labels.len(), 5);
        assert_eq!(props.tick_labels[0], "0");
    }

    #[test]
    fn test_count_chart_is_unscaled() {
        let props = count_chart(data(&[Some(1500.0), Some(3_000_000.0), None]));
        assert_eq!(props.data[0].value, Some(1500.0));
        assert_eq!(props.data[1].value, Some(3_000_000.0));
        assert_eq!(props.unit, "Count");
        assert_eq!(props.tick_labels.last().map(String::as_str), Some("3M"));
    }

    #[test]
    fn test_format_count_tick() {
        assert_eq!(format_count_tick(0.0), "0");
        assert_eq!(format_count_tick(950.0), "950");
        assert_eq!(format_count_tick(12.345), "12.3");
        assert_eq!(format_count_tick(1500.0), "1.5k");
        assert_eq!(format_count_tick(123_456.0), "123k");
        assert_eq!(format_count_tick(2_000_000.0), "2M");
        assert_eq!(format_count_tick(4_560_000_000.0), "4.56B");
        assert_eq!(format_count_tick(7e12), "7T");
        assert_eq!(format_count_tick(999_950.0), "1M");
        assert_eq!(format_count_tick(5e15), "5000T");
    }

    #[test]
    fn test_utilization_zero_cores_is_empty() {
        let props = utilization_chart(data(&[Some(1e9), Some(2e9)]), 60, 0);
        assert!(props.data.is_empty());
    }

    #[test]
    fn test_utilization_percentages() {
        // 60s window, 2 cores: 60e9 busy ns is one full core, i.e. 50%
        let props = utilization_chart(data(&[Some(60e9), None, Some(120e9)]), 60, 2);
        assert_eq!(props.data[0].value, Some(50.0));
        assert_eq!(props.data[1].value, None);
        assert_eq!(props.data[2].value, Some(100.0));
        assert_eq!(props.tick_labels.last().map(String::as_str), Some("100%"));
    }
}
