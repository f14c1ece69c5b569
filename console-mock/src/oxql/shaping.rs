//! Collapsing an OxQL table into a single chart series.

use super::{ChartDatum, Table, Timeseries};

/// Sum the first value column of every timeseries, index by index.
///
/// Only defined values contribute. An index where every series is absent stays absent so the
/// chart shows a gap rather than a drop to zero.
pub fn sum_points(timeseries: &[Timeseries]) -> Vec<Option<f64>> {
    let len = timeseries
        .iter()
        .map(|ts| ts.points.first_column().len())
        .max()
        .unwrap_or(0);

    (0..len)
        .map(|i| {
            timeseries
                .iter()
                .filter_map(|ts| ts.points.first_column().get(i).copied().flatten())
                .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v))
        })
        .collect()
}

/// Turn a table into chart data: one summed value per shared timestamp, minus the first point.
///
/// Delta metrics report the running total as their first sample, which would dwarf everything
/// after it. Callers move their start time back by two alignment windows so that dropping it
/// still leaves the requested range covered.
pub fn compose_chart_data(table: &Table) -> Vec<ChartDatum> {
    let Some(first) = table.timeseries.first() else {
        return Vec::new();
    };
    let summed = sum_points(&table.timeseries);

    first
        .points
        .timestamps
        .iter()
        .zip(summed)
        .skip(1)
        .map(|(timestamp, value)| ChartDatum {
            timestamp: *timestamp,
            value,
        })
        .collect()
}

/// Largest defined value in the series, `None` when every point is a gap.
pub fn largest_value(data: &[ChartDatum]) -> Option<f64> {
    data.iter().filter_map(|d| d.value).reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxql::{MetricType, Points, ValueArray, Values};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn series(values: Vec<Option<f64>>) -> Timeseries {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Timeseries {
            fields: BTreeMap::new(),
            points: Points {
                timestamps: (0..values.len()).map(|i| start + Duration::minutes(i as i64)).collect(),
                values: vec![Values {
                    values: ValueArray::Double(values),
                    metric_type: MetricType::Delta,
                }],
            },
        }
    }

    #[test]
    fn test_sum_skips_absent_values() {
        let summed = sum_points(&[series(vec![Some(1.0), None, Some(3.0)]), series(vec![Some(2.0), Some(3.0), None])]);
        assert_eq!(summed, vec![Some(3.0), Some(3.0), Some(3.0)]);
    }

    #[test]
    fn test_sum_all_absent_is_gap_not_zero() {
        let summed = sum_points(&[series(vec![Some(1.0), None]), series(vec![Some(1.0), None])]);
        assert_eq!(summed, vec![Some(2.0), None]);
    }

    #[test]
    fn test_sum_keeps_explicit_zero() {
        let summed = sum_points(&[series(vec![Some(0.0)]), series(vec![None])]);
        assert_eq!(summed, vec![Some(0.0)]);
    }

    #[test]
    fn test_sum_empty() {
        assert!(sum_points(&[]).is_empty());
    }

    #[test]
    fn test_compose_drops_first_point() {
        let table = Table {
            name: "virtual_disk:bytes_read".to_string(),
            timeseries: vec![
                series(vec![Some(1000.0), Some(1.0), None, Some(4.0)]),
                series(vec![Some(2000.0), Some(2.0), None, None]),
            ],
        };
        let data = compose_chart_data(&table);
        let values: Vec<_> = data.iter().map(|d| d.value).collect();
        assert_eq!(values, vec![Some(3.0), None, Some(4.0)]);
        assert_eq!(data[0].timestamp, table.timeseries[0].points.timestamps[1]);
    }

    #[test]
    fn test_compose_empty_table() {
        let table = Table {
            name: "t".to_string(),
            timeseries: vec![],
        };
        assert!(compose_chart_data(&table).is_empty());
    }

    #[test]
    fn test_largest_value() {
        let data = compose_chart_data(&Table {
            name: "t".to_string(),
            timeseries: vec![series(vec![Some(100.0), Some(1.0), Some(7.0), None])],
        });
        assert_eq!(largest_value(&data), Some(7.0));
        assert_eq!(largest_value(&[]), None);
    }
}
