//! Text output: the per-variant listing, summary tables and failures.

use prettytable::{row, Cell, Row, Table};
use rustc_hash::FxHashMap;

use crate::driver::{FailureKind, SweepOutcome};
use crate::results::ResultTable;
use crate::variant::VariantFamily;

/// Formats nanoseconds with thousands separators and two decimals.
pub fn format_nanos(ns: f64) -> String {
    let fixed = format!("{:.2}", ns);
    let (whole, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let mut grouped = String::new();
    for (i, c) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let whole: String = grouped.chars().rev().collect();
    format!("{}.{}", whole, frac)
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "-".to_string(), |r| format!("{:.2}x", r))
}

/// Lists every recorded timing, grouped by variant in declaration order
/// and by size in axis order. Missing sizes are left out.
pub fn format_listing(table: &ResultTable, family: &VariantFamily) -> String {
    let axis = &table.axis().name;
    let mut out = String::new();
    for variant in &family.variants {
        out.push_str(&format!("\n{}:\n", variant.id));
        for measurement in table.measurements(&variant.id) {
            out.push_str(&format!(
                "  {}: {:>6}, Time: {:>12} ns\n",
                axis,
                measurement.value,
                format_nanos(measurement.nanos)
            ));
        }
    }
    out
}

/// One row per size, one column per variant.
pub fn timing_table(table: &ResultTable, family: &VariantFamily) -> Table {
    let mut out = Table::new();
    let mut header = vec![Cell::new(&table.axis().name)];
    header.extend(family.variants.iter().map(|v| Cell::new(&format!("{} (ns)", v.display_name()))));
    out.add_row(Row::new(header));

    let series: Vec<_> = family.variants.iter().map(|v| table.series(&v.id)).collect();
    for (pos, value) in table.axis().values.iter().enumerate() {
        let mut cells = vec![Cell::new(&value.to_string())];
        for timings in &series {
            let text = timings[pos].map_or_else(|| "-".to_string(), format_nanos);
            cells.push(Cell::new(&text));
        }
        out.add_row(Row::new(cells));
    }
    out
}

/// Speedup of every non-baseline variant over the baseline, per size.
pub fn speedup_table(table: &ResultTable, family: &VariantFamily) -> Table {
    let mut out = Table::new();
    let mut header = vec![Cell::new(&table.axis().name)];
    header.extend(family.comparisons().map(|v| Cell::new(v.display_name())));
    out.add_row(Row::new(header));

    let series: Vec<_> = family
        .comparisons()
        .map(|v| table.speedup_series(&family.baseline, &v.id))
        .collect();
    for (pos, value) in table.axis().values.iter().enumerate() {
        let mut cells = vec![Cell::new(&value.to_string())];
        for speedups in &series {
            cells.push(Cell::new(&format_ratio(speedups.ratios[pos])));
        }
        out.add_row(Row::new(cells));
    }
    out
}

/// Configurations that yielded nothing, with the kind of failure.
pub fn failure_table(outcome: &SweepOutcome) -> Table {
    let mut counts: FxHashMap<FailureKind, usize> = FxHashMap::default();
    for failure in &outcome.failures {
        *counts.entry(failure.kind).or_default() += 1;
    }

    let mut out = Table::new();
    out.add_row(row!["Configuration", "Problem"]);
    for failure in &outcome.failures {
        out.add_row(row![failure.configuration.to_string(), failure.kind.to_string()]);
    }
    for (family, variant) in &outcome.silent_variants {
        out.add_row(row![format!("{}/{}", family, variant), "never matched"]);
    }
    for kind in [FailureKind::BuildFailure, FailureKind::RunFailure, FailureKind::NoMatchFound] {
        if let Some(count) = counts.get(&kind) {
            out.add_row(row![format!("TOTAL {}", kind), count]);
        }
    }
    out
}

/// Prints the listing and the summary tables for every family.
pub fn print_report(outcome: &SweepOutcome, families: &[VariantFamily]) {
    println!("\nBenchmark Results:");
    for (table, family) in outcome.tables.iter().zip(families) {
        print!("{}", format_listing(table, family));
    }

    for (table, family) in outcome.tables.iter().zip(families) {
        println!("\nExecution time for family: {}", family.name);
        timing_table(table, family).printstd();
        if let Some(baseline) = family.baseline() {
            println!("\nSpeedup over {} for family: {}", baseline.display_name(), family.name);
            speedup_table(table, family).printstd();
        }
    }

    if !outcome.failures.is_empty() || !outcome.silent_variants.is_empty() {
        println!(
            "\n{} of {} configurations produced no results:",
            outcome.failures.len(),
            outcome.attempted
        );
        failure_table(outcome).printstd();
    }
}
