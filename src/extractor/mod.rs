//! Pulls timing values out of benchmark harness output.
//!
//! The harness prints one line per finished benchmark, e.g.
//!
//! ```text
//! test tests::benchmark_serial_sum ... bench:      1,234.56 ns/iter (+/- 56)
//! ```
//!
//! Only the `bench: <number> ns/iter` part is looked at here. The benchmark
//! name is left to the [`crate::variant`] classifier.

use regex::Regex;

use crate::error::Result;

pub const DEFAULT_MARKER: &str = "bench:";
pub const DEFAULT_UNIT: &str = "ns/iter";

/// Outcome of scanning a single output line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineScan<'a> {
    /// Marker, number and unit found; value in nanoseconds.
    Timing(f64),
    /// Marker and unit found around a field that is not a number.
    Malformed(&'a str),
    /// Not a benchmark result line.
    NoMatch,
}

/// Matches `<marker> <number> <unit>` anywhere in a line.
#[derive(Debug, Clone)]
pub struct Extractor {
    pattern: Regex,
}

impl Extractor {
    /// Builds an extractor for a custom marker and unit. Both are taken
    /// literally.
    pub fn new(marker: &str, unit: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"{}\s+([0-9][0-9,.]*)\s+{}",
            regex::escape(marker),
            regex::escape(unit)
        ))?;
        Ok(Self { pattern })
    }

    /// Scans a line, telling malformed numeric fields apart from lines
    /// that simply aren't results.
    pub fn scan<'a>(&self, line: &'a str) -> LineScan<'a> {
        let Some(field) = self.pattern.captures(line).and_then(|c| c.get(1)) else {
            return LineScan::NoMatch;
        };

        match parse_number(field.as_str()) {
            Some(value) => LineScan::Timing(value),
            None => LineScan::Malformed(field.as_str()),
        }
    }

    /// Returns the timing on this line in nanoseconds, if there is one.
    pub fn extract(&self, line: &str) -> Option<f64> {
        match self.scan(line) {
            LineScan::Timing(value) => Some(value),
            LineScan::Malformed(_) | LineScan::NoMatch => None,
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER, DEFAULT_UNIT).expect("default extractor pattern is valid")
    }
}

/// Strips thousands separators and converts. At most one decimal point.
fn parse_number(field: &str) -> Option<f64> {
    let digits: String = field.chars().filter(|&c| c != ',').collect();
    if digits.matches('.').count() > 1 {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_thousands_separators() {
        let extractor = Extractor::default();
        assert_eq!(extractor.extract("bench: 1,234.56 ns/iter"), Some(1234.56));
    }

    #[test]
    fn parses_harness_line() {
        let extractor = Extractor::default();
        let line = "test tests::benchmark_serial_sum ... bench:      12,345 ns/iter (+/- 678)";
        assert_eq!(extractor.extract(line), Some(12345.0));
    }

    #[test]
    fn lines_without_marker_do_not_match() {
        let extractor = Extractor::default();
        for line in [
            "",
            "running 5 tests",
            "test result: ok. 0 passed; 0 failed; 0 ignored; 5 measured",
            "1,234 ns/iter",
            "bench: 1,234 ms/iter",
        ] {
            assert_eq!(extractor.scan(line), LineScan::NoMatch, "{line:?}");
        }
    }

    #[test]
    fn malformed_number_is_skipped() {
        let extractor = Extractor::default();
        assert_eq!(extractor.scan("bench: 1.2.3 ns/iter"), LineScan::Malformed("1.2.3"));
        assert_eq!(extractor.extract("bench: 1.2.3 ns/iter"), None);
    }

    #[test]
    fn custom_marker_is_literal() {
        let extractor = Extractor::new("time(", "us)").unwrap();
        assert_eq!(extractor.extract("mat_mul time( 2,000.5 us)"), Some(2000.5));
        assert_eq!(extractor.extract("mat_mul time 2,000.5 us"), None);
    }

    proptest! {
        #[test]
        fn separated_numbers_round_trip(whole in 0u64..10_000_000_000, frac in 0u32..100) {
            let mut grouped = String::new();
            let digits = whole.to_string();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(c);
            }
            let line = format!("test x ... bench: {grouped}.{frac:02} ns/iter (+/- 1)");
            let expected: f64 = format!("{whole}.{frac:02}").parse().unwrap();
            prop_assert_eq!(Extractor::default().extract(&line), Some(expected));
        }

        #[test]
        fn never_matches_without_marker(line in "[^:]*") {
            prop_assert_eq!(Extractor::default().extract(&line), None);
        }
    }
}
