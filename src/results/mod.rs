//! Per-family result tables and the speedup series derived from them.
//!
//! Missing data is represented as `None` throughout: a lookup for a size
//! that produced no measurement yields `None`, never zero and never an
//! error, and every series has exactly one entry per axis value.

use rustc_hash::FxHashMap;

use crate::sweep::SweepAxis;

/// A timing parsed from one line of benchmark output.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub variant: String,
    pub value: u64,
    /// Nanoseconds per iteration.
    pub nanos: f64,
}

/// Ratios of baseline time over variant time, aligned to the axis values.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedupSeries {
    pub baseline: String,
    pub variant: String,
    pub ratios: Vec<Option<f64>>,
}

/// Speedup of `comparison` relative to `baseline`.
///
/// `None` when either side is missing or the comparison time is not
/// positive.
pub fn speedup(baseline: Option<f64>, comparison: Option<f64>) -> Option<f64> {
    match (baseline, comparison) {
        (Some(b), Some(c)) if c > 0.0 => Some(b / c),
        _ => None,
    }
}

/// Measurements of one variant family along one axis.
#[derive(Debug, Clone)]
pub struct ResultTable {
    family: String,
    axis: SweepAxis,
    entries: FxHashMap<String, FxHashMap<u64, Measurement>>,
}

impl ResultTable {
    pub fn new(family: &str, axis: &SweepAxis) -> Self {
        Self {
            family: family.to_string(),
            axis: axis.clone(),
            entries: FxHashMap::default(),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn axis(&self) -> &SweepAxis {
        &self.axis
    }

    /// Stores a measurement, replacing any earlier one for the same
    /// variant and size. Returns the replaced measurement.
    pub fn record(&mut self, measurement: Measurement) -> Option<Measurement> {
        self.entries
            .entry(measurement.variant.clone())
            .or_default()
            .insert(measurement.value, measurement)
    }

    pub fn get(&self, variant: &str, value: u64) -> Option<f64> {
        self.entries
            .get(variant)
            .and_then(|by_value| by_value.get(&value))
            .map(|m| m.nanos)
    }

    /// Timings of `variant` in axis order, `None` where nothing was recorded.
    pub fn series(&self, variant: &str) -> Vec<Option<f64>> {
        self.axis
            .values
            .iter()
            .map(|&value| self.get(variant, value))
            .collect()
    }

    /// Recorded measurements of `variant`, in axis order.
    pub fn measurements(&self, variant: &str) -> Vec<&Measurement> {
        let Some(by_value) = self.entries.get(variant) else {
            return Vec::new();
        };
        self.axis
            .values
            .iter()
            .filter_map(|value| by_value.get(value))
            .collect()
    }

    pub fn speedup_series(&self, baseline: &str, variant: &str) -> SpeedupSeries {
        let ratios = self
            .series(baseline)
            .into_iter()
            .zip(self.series(variant))
            .map(|(b, c)| speedup(b, c))
            .collect();
        SpeedupSeries {
            baseline: baseline.to_string(),
            variant: variant.to_string(),
            ratios,
        }
    }

    pub fn contains_variant(&self, variant: &str) -> bool {
        self.entries.get(variant).is_some_and(|by_value| !by_value.is_empty())
    }

    pub fn contains_value(&self, value: u64) -> bool {
        self.entries.values().any(|by_value| by_value.contains_key(&value))
    }

    /// Total number of measurements across all variants.
    pub fn len(&self) -> usize {
        self.entries.values().map(|by_value| by_value.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(variant: &str, value: u64, nanos: f64) -> Measurement {
        Measurement {
            variant: variant.to_string(),
            value,
            nanos,
        }
    }

    fn table() -> ResultTable {
        let mut table = ResultTable::new("sum", &SweepAxis::new("LEN", 1, &[10, 20, 50]));
        table.record(measurement("serial", 10, 100.0));
        table.record(measurement("serial", 50, 500.0));
        table.record(measurement("parallel", 10, 50.0));
        table.record(measurement("parallel", 20, 0.0));
        table.record(measurement("parallel", 50, 125.0));
        table
    }

    #[test]
    fn speedup_policy() {
        assert_eq!(speedup(Some(10.0), Some(5.0)), Some(2.0));
        assert_eq!(speedup(Some(10.0), Some(0.0)), None);
        assert_eq!(speedup(Some(10.0), Some(-1.0)), None);
        assert_eq!(speedup(None, Some(5.0)), None);
        assert_eq!(speedup(Some(10.0), None), None);
    }

    #[test]
    fn missing_value_is_none() {
        let table = table();
        assert_eq!(table.get("serial", 20), None);
        assert_eq!(table.get("thread4", 10), None);
        assert_eq!(table.series("serial"), vec![Some(100.0), None, Some(500.0)]);
        assert_eq!(table.series("thread4"), vec![None, None, None]);
    }

    #[test]
    fn zero_timing_is_kept_distinct_from_missing() {
        let table = table();
        assert_eq!(table.get("parallel", 20), Some(0.0));
    }

    #[test]
    fn speedup_series_is_aligned() {
        let table = table();
        let series = table.speedup_series("serial", "parallel");
        assert_eq!(series.ratios, vec![Some(2.0), None, Some(4.0)]);
        assert_eq!(series.baseline, "serial");
        assert_eq!(series.variant, "parallel");
    }

    #[test]
    fn speedup_is_repeatable() {
        let table = table();
        let first = table.speedup_series("serial", "parallel");
        let second = table.speedup_series("serial", "parallel");
        let bits = |s: &SpeedupSeries| s.ratios.iter().map(|r| r.map(f64::to_bits)).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn last_write_wins() {
        let mut table = table();
        let previous = table.record(measurement("serial", 10, 90.0));
        assert_eq!(previous.map(|m| m.nanos), Some(100.0));
        assert_eq!(table.get("serial", 10), Some(90.0));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn measurements_follow_axis_order() {
        let mut table = ResultTable::new("sum", &SweepAxis::new("LEN", 1, &[50, 10, 20]));
        table.record(measurement("serial", 10, 1.0));
        table.record(measurement("serial", 50, 5.0));
        let values: Vec<_> = table.measurements("serial").iter().map(|m| m.value).collect();
        assert_eq!(values, [50, 10]);
        assert!(table.contains_variant("serial"));
        assert!(!table.contains_variant("parallel"));
        assert!(table.contains_value(50));
        assert!(!table.contains_value(20));
    }
}
