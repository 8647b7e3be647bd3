//! Runs the sweep: build, run and parse once per configuration.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::extractor::{Extractor, LineScan};
use crate::results::{Measurement, ResultTable};
use crate::runner::{BenchRunner, StepOutput};
use crate::sweep::{Configuration, SweepPlan};
use crate::variant::{Classification, VariantFamily};

/// Lines of captured output kept in failure diagnostics.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The build step could not be started or exited non-zero.
    BuildFailure,
    /// The benchmark step could not be started or exited non-zero.
    RunFailure,
    /// The benchmark ran but no line matched any variant.
    NoMatchFound,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::BuildFailure => write!(f, "build failed"),
            FailureKind::RunFailure => write!(f, "run failed"),
            FailureKind::NoMatchFound => write!(f, "no results"),
        }
    }
}

/// A configuration that produced no measurements, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFailure {
    pub configuration: Configuration,
    pub kind: FailureKind,
    /// Tail of whatever the failing step printed.
    pub diagnostic: String,
}

/// Line counts from parsing one benchmark run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub matched: usize,
    pub unrecognized: usize,
    pub malformed: usize,
}

/// Everything a sweep produced.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// One table per family, in plan order.
    pub tables: Vec<ResultTable>,
    pub failures: Vec<ConfigFailure>,
    /// `(family, variant)` pairs that never matched a single output line.
    pub silent_variants: Vec<(String, String)>,
    pub attempted: usize,
}

impl SweepOutcome {
    pub fn table(&self, family: &str) -> Option<&ResultTable> {
        self.tables.iter().find(|table| table.family() == family)
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &ConfigFailure> {
        self.failures.iter().filter(move |failure| failure.kind == kind)
    }
}

/// Classifies every timing line of `text` against `family`.
///
/// Lines that carry a timing but no known benchmark name are counted as
/// unrecognized; lines whose number does not parse are counted as malformed.
pub fn collect_measurements(
    extractor: &Extractor,
    family: &VariantFamily,
    text: &str,
    value: u64,
) -> (Vec<Measurement>, ScanStats) {
    let mut measurements = Vec::new();
    let mut stats = ScanStats::default();

    for line in text.lines() {
        match extractor.scan(line) {
            LineScan::Timing(nanos) => match family.classify(line) {
                Classification::Known(variant) => {
                    stats.matched += 1;
                    measurements.push(Measurement {
                        variant: variant.id.clone(),
                        value,
                        nanos,
                    });
                }
                Classification::Unrecognized => {
                    stats.unrecognized += 1;
                    debug!(family = %family.name, line, "timing line matches no variant");
                }
            },
            LineScan::Malformed(field) => {
                stats.malformed += 1;
                debug!(field, line, "skipping line with malformed timing");
            }
            LineScan::NoMatch => {}
        }
    }

    (measurements, stats)
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

fn step_failure(
    configuration: &Configuration,
    kind: FailureKind,
    result: std::io::Result<StepOutput>,
) -> Result<StepOutput, ConfigFailure> {
    let step = match kind {
        FailureKind::BuildFailure => "build",
        _ => "benchmark",
    };
    match result {
        Ok(output) if output.success => Ok(output),
        Ok(output) => {
            let diagnostic = tail(&output.combined(), DIAGNOSTIC_TAIL_LINES);
            match output.code {
                Some(code) => error!(%configuration, code, "{step} step failed"),
                None => error!(%configuration, "{step} step terminated by signal"),
            }
            if !diagnostic.is_empty() {
                error!(%configuration, "{step} output:\n{diagnostic}");
            }
            Err(ConfigFailure {
                configuration: configuration.clone(),
                kind,
                diagnostic,
            })
        }
        Err(err) => {
            error!(%configuration, %err, "could not start {step} step");
            Err(ConfigFailure {
                configuration: configuration.clone(),
                kind,
                diagnostic: err.to_string(),
            })
        }
    }
}

/// Drives a [`BenchRunner`] through every configuration of a plan.
///
/// Configurations run one after another in axis order. A failing
/// configuration is recorded and skipped; the sweep itself never fails.
#[derive(Debug, Clone, Default)]
pub struct SweepDriver {
    extractor: Extractor,
}

impl SweepDriver {
    pub fn new(extractor: Extractor) -> Self {
        Self { extractor }
    }

    pub fn run<R: BenchRunner + ?Sized>(&self, plan: &SweepPlan, runner: &mut R) -> SweepOutcome {
        let mut tables: Vec<ResultTable> = plan
            .pairs()
            .map(|(axis, family)| ResultTable::new(&family.name, axis))
            .collect();
        let mut failures = Vec::new();
        let mut attempted = 0;

        for axis in plan.axes() {
            let indices: Vec<usize> = plan
                .families()
                .iter()
                .enumerate()
                .filter(|(_, family)| family.axis == axis.name)
                .map(|(i, _)| i)
                .collect();
            if indices.is_empty() {
                continue;
            }

            info!(axis = %axis.name, configurations = axis.values.len(), "sweeping axis");
            for configuration in plan.configurations(axis) {
                attempted += 1;
                if let Err(failure) =
                    self.run_configuration(&configuration, plan, &indices, &mut tables, runner)
                {
                    failures.push(failure);
                }
            }
        }

        let silent_variants = silent_variants(plan, &tables);
        SweepOutcome {
            tables,
            failures,
            silent_variants,
            attempted,
        }
    }

    fn run_configuration<R: BenchRunner + ?Sized>(
        &self,
        configuration: &Configuration,
        plan: &SweepPlan,
        families: &[usize],
        tables: &mut [ResultTable],
        runner: &mut R,
    ) -> Result<(), ConfigFailure> {
        info!(%configuration, "building");
        step_failure(configuration, FailureKind::BuildFailure, runner.build(&configuration.env))?;

        info!(%configuration, "running benchmarks");
        let output = step_failure(configuration, FailureKind::RunFailure, runner.run(&configuration.env))?;

        let mut total = ScanStats::default();
        for &i in families {
            let family = &plan.families()[i];
            let (measurements, stats) =
                collect_measurements(&self.extractor, family, &output.stdout, configuration.value);
            for measurement in measurements {
                if let Some(previous) = tables[i].record(measurement) {
                    debug!(%configuration, variant = %previous.variant, "measurement reported twice, keeping the later one");
                }
            }
            total.matched += stats.matched;
            total.unrecognized += stats.unrecognized;
            total.malformed += stats.malformed;
        }

        if total.malformed > 0 {
            warn!(%configuration, lines = total.malformed, "skipped lines with malformed timings");
        }

        if total.matched == 0 {
            warn!(
                %configuration,
                unrecognized = total.unrecognized,
                "benchmarks ran but no result line matched any variant"
            );
            return Err(ConfigFailure {
                configuration: configuration.clone(),
                kind: FailureKind::NoMatchFound,
                diagnostic: tail(&output.stdout, DIAGNOSTIC_TAIL_LINES),
            });
        }

        info!(%configuration, results = total.matched, "benchmarks completed");
        Ok(())
    }
}

/// Variants that never matched during their whole axis sweep. Usually a
/// keyword that drifted from the benchmark names the harness prints.
fn silent_variants(plan: &SweepPlan, tables: &[ResultTable]) -> Vec<(String, String)> {
    let mut silent = Vec::new();
    for (family, table) in plan.families().iter().zip(tables) {
        for variant in &family.variants {
            if !table.contains_variant(&variant.id) {
                warn!(
                    family = %family.name,
                    variant = %variant.id,
                    keyword = %variant.keyword,
                    "variant produced no results over the whole sweep"
                );
                silent.push((family.name.clone(), variant.id.clone()));
            }
        }
    }
    silent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::SweepAxis;
    use crate::variant::VariantSpec;
    use tracing_test::traced_test;

    fn family() -> VariantFamily {
        VariantFamily {
            name: "sum".to_string(),
            axis: "LEN".to_string(),
            baseline: "serial".to_string(),
            variants: vec![
                VariantSpec::new("parallel", "", "parallel_sum"),
                VariantSpec::new("serial", "", "serial_sum"),
            ],
        }
    }

    #[test]
    fn collects_known_variants_only() {
        let text = "\
running 3 tests
test tests::benchmark_parallel_sum ... bench:         1,500 ns/iter (+/- 20)
test tests::benchmark_serial_sum   ... bench:         3,000 ns/iter (+/- 30)
test tests::thread4_sum            ... bench:         2,000 ns/iter (+/- 25)
test tests::benchmark_serial_sum   ... bench:         1.2.3 ns/iter (+/- 30)

test result: ok. 0 passed; 0 failed; 0 ignored; 3 measured
";
        let (measurements, stats) = collect_measurements(&Extractor::default(), &family(), text, 100);
        assert_eq!(
            stats,
            ScanStats {
                matched: 2,
                unrecognized: 1,
                malformed: 1
            }
        );
        assert_eq!(measurements[0].variant, "parallel");
        assert_eq!(measurements[0].nanos, 1500.0);
        assert_eq!(measurements[1].variant, "serial");
        assert!(measurements.iter().all(|m| m.value == 100));
    }

    struct FixedRunner {
        stdout: &'static str,
    }

    impl BenchRunner for FixedRunner {
        fn build(&mut self, _env: &crate::sweep::EnvOverlay) -> std::io::Result<StepOutput> {
            Ok(StepOutput::ok(""))
        }

        fn run(&mut self, _env: &crate::sweep::EnvOverlay) -> std::io::Result<StepOutput> {
            Ok(StepOutput::ok(self.stdout))
        }
    }

    fn plan() -> SweepPlan {
        SweepPlan::new(vec![SweepAxis::new("LEN", 1, &[10])], vec![family()]).unwrap()
    }

    #[test]
    #[traced_test]
    fn empty_output_is_reported_as_no_match() {
        let mut runner = FixedRunner {
            stdout: "running 0 tests\n",
        };
        let outcome = SweepDriver::default().run(&plan(), &mut runner);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, FailureKind::NoMatchFound);
        assert!(logs_contain("no result line matched any variant"));
        assert!(logs_contain("variant produced no results over the whole sweep"));
    }

    #[test]
    #[traced_test]
    fn malformed_lines_are_logged() {
        let mut runner = FixedRunner {
            stdout: "test benchmark_serial_sum ... bench: 1.2.3 ns/iter\ntest benchmark_parallel_sum ... bench: 5 ns/iter\n",
        };
        let outcome = SweepDriver::default().run(&plan(), &mut runner);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.table("sum").unwrap().get("parallel", 10), Some(5.0));
        assert_eq!(outcome.table("sum").unwrap().get("serial", 10), None);
        assert!(logs_contain("skipped lines with malformed timings"));
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
        assert_eq!(tail("", 5), "");
    }
}
