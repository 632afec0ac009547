//! Projection of raw metric records into plot-ready series
//!
//! The hub hands back a flat bag of mixed metric types, newest-first. Charts
//! want two aligned numeric series running oldest to newest. This module is a
//! pure filter/reorder/reshape step: no interpolation, no gap-filling, no
//! resampling.

use chrono::{DateTime, Local, Utc};

use crate::MetricRecord;

/// Aggregate CPU usage reading, in percent.
pub const CPU_USAGE: &str = "cpu_usage";

/// Aggregate memory reading, in megabytes.
pub const MEMORY_TOTAL_MB: &str = "memory_total_mb";

/// Chart-shaped series: time labels plus one numeric sequence per quantity.
///
/// `labels` is sized to the cpu series. When one metric type lags the other,
/// the memory series may be shorter or longer than the labels; the chart
/// layer tolerates that rather than this module inventing data points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotSeries {
    pub labels: Vec<String>,
    pub cpu: Vec<f64>,
    pub memory: Vec<f64>,
}

impl PlotSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.cpu.is_empty() && self.memory.is_empty()
    }
}

/// Reshape a polled metric bag into a [`PlotSeries`].
///
/// Only the two server-aggregate quantities (`cpu_usage` and
/// `memory_total_mb` with an empty `resource`) survive; everything else is an
/// allow-list miss and dropped. The hub nominally returns records descending
/// by time, but order is not trusted: each subset is stably sorted ascending,
/// which also preserves backend-return order for equal timestamps.
///
/// Total function: an empty bag projects to empty series.
pub fn project(records: &[MetricRecord]) -> PlotSeries {
    let cpu = aggregate_subset(records, CPU_USAGE);
    let memory = aggregate_subset(records, MEMORY_TOTAL_MB);

    PlotSeries {
        labels: cpu.iter().map(|r| format_label(r.time)).collect(),
        cpu: cpu.iter().map(|r| r.value).collect(),
        memory: memory.iter().map(|r| r.value).collect(),
    }
}

/// Server-aggregate records of one type, ascending by time.
fn aggregate_subset<'a>(records: &'a [MetricRecord], metric_type: &str) -> Vec<&'a MetricRecord> {
    let mut subset: Vec<&MetricRecord> = records
        .iter()
        .filter(|r| r.metric_type == metric_type && r.resource.is_empty())
        .collect();

    subset.sort_by_key(|r| r.time);
    subset
}

/// Human-readable time-of-day label in the viewer's local timezone.
fn format_label(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(time: &str, metric_type: &str, resource: &str, value: f64) -> MetricRecord {
        MetricRecord {
            time: time.parse().unwrap(),
            server_id: "web-1".to_string(),
            metric_type: metric_type.to_string(),
            resource: resource.to_string(),
            value,
            tags: serde_json::Value::Null,
        }
    }

    #[test]
    fn empty_input_projects_to_empty_series() {
        let series = project(&[]);

        assert!(series.is_empty());
        assert_eq!(series, PlotSeries::default());
    }

    #[test]
    fn descending_input_comes_out_ascending() {
        // Hub order: newest first, mixed types.
        let records = vec![
            record("2026-08-30T12:00:02Z", CPU_USAGE, "", 50.0),
            record("2026-08-30T12:00:01Z", CPU_USAGE, "", 40.0),
            record("2026-08-30T12:00:01Z", MEMORY_TOTAL_MB, "", 512.0),
        ];

        let series = project(&records);

        assert_eq!(series.cpu, vec![40.0, 50.0]);
        assert_eq!(series.memory, vec![512.0]);
        assert_eq!(series.labels.len(), 2);
        assert_eq!(series.labels[0], format_label(records[1].time));
        assert_eq!(series.labels[1], format_label(records[0].time));
    }

    #[test]
    fn labels_track_the_cpu_subset() {
        let records = vec![
            record("2026-08-30T12:00:03Z", MEMORY_TOTAL_MB, "", 700.0),
            record("2026-08-30T12:00:02Z", MEMORY_TOTAL_MB, "", 600.0),
            record("2026-08-30T12:00:01Z", CPU_USAGE, "", 40.0),
        ];

        let series = project(&records);

        // Memory outruns cpu; labels still size to cpu. The chart tolerates it.
        assert_eq!(series.labels.len(), 1);
        assert_eq!(series.cpu, vec![40.0]);
        assert_eq!(series.memory, vec![600.0, 700.0]);
    }

    #[test]
    fn sub_resource_records_are_dropped() {
        let records = vec![
            record("2026-08-30T12:00:01Z", CPU_USAGE, "cpu0", 90.0),
            record("2026-08-30T12:00:01Z", CPU_USAGE, "", 40.0),
            record("2026-08-30T12:00:01Z", MEMORY_TOTAL_MB, "buffers", 100.0),
        ];

        let series = project(&records);

        assert_eq!(series.cpu, vec![40.0]);
        assert!(series.memory.is_empty());
    }

    #[test]
    fn unknown_metric_types_are_invisible() {
        let records = vec![
            record("2026-08-30T12:00:01Z", "disk_io", "", 3.0),
            record("2026-08-30T12:00:01Z", "load_average", "", 1.5),
        ];

        let series = project(&records);

        assert!(series.is_empty());
    }

    #[test]
    fn equal_timestamps_keep_backend_order() {
        // Stable sort: ties stay in backend-return order.
        let records = vec![
            record("2026-08-30T12:00:01Z", CPU_USAGE, "", 10.0),
            record("2026-08-30T12:00:01Z", CPU_USAGE, "", 20.0),
        ];

        let series = project(&records);

        assert_eq!(series.cpu, vec![10.0, 20.0]);
    }

    #[test]
    fn already_ascending_input_is_untouched() {
        let records = vec![
            record("2026-08-30T12:00:01Z", CPU_USAGE, "", 40.0),
            record("2026-08-30T12:00:02Z", CPU_USAGE, "", 50.0),
        ];

        let series = project(&records);

        assert_eq!(series.cpu, vec![40.0, 50.0]);
    }
}
