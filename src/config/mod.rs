//! Sweep configuration: built-in defaults and JSON loading.
//!
//! The keyword tables below are the only place benchmark names are spelled
//! out. Keep them in sync with the `#[bench]` functions of the harness.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::extractor::{Extractor, DEFAULT_MARKER, DEFAULT_UNIT};
use crate::runner::{CommandRunner, CommandSpec};
use crate::sweep::{SweepAxis, SweepPlan};
use crate::variant::{VariantFamily, VariantSpec};

/// Problem sizes for the summation benchmarks.
pub const LEN_VALUES: [u64; 19] = [
    10, 20, 50, 100, 200, 400, 700, 1000, 2000, 3000, 5000, 7000, 10000, 15000, 20000, 30000,
    50000, 75000, 100000,
];

/// Matrix dimensions for the multiplication benchmarks.
pub const MLEN_VALUES: [u64; 6] = [16, 32, 64, 128, 256, 512];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub axes: Vec<SweepAxis>,
    pub families: Vec<VariantFamily>,
    pub build: CommandSpec,
    pub run: CommandSpec,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Where the charts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn sum_family() -> VariantFamily {
    VariantFamily {
        name: "sum".to_string(),
        axis: "LEN".to_string(),
        baseline: "serial-sum".to_string(),
        variants: vec![
            VariantSpec::new("serial-sum", "Serial", "serial_sum"),
            VariantSpec::new("parallel-sum", "Parallel (Rayon)", "parallel_sum"),
            VariantSpec::new("thread1-sum", "Manual Threads (1)", "thread1_sum"),
            VariantSpec::new("thread4-sum", "Manual Threads (4)", "thread4_sum"),
            VariantSpec::new("thread16-sum", "Manual Threads (16)", "thread16_sum"),
            VariantSpec::new("c-serial-sum", "C Serial", "c_serial_sum"),
            VariantSpec::new("c-parallel-sum", "C Parallel (OpenMP)", "c_parallel_sum"),
        ],
    }
}

fn matmul_family() -> VariantFamily {
    VariantFamily {
        name: "matmul".to_string(),
        axis: "MLEN".to_string(),
        baseline: "mat-mul-serial".to_string(),
        variants: vec![
            VariantSpec::new("mat-mul-serial", "Serial", "mat_mul_serial"),
            VariantSpec::new("mat-mul-parallel", "Parallel (Rayon)", "mat_mul_parallel"),
            VariantSpec::new("c-mat-mul-serial", "C Serial", "c_mat_mul_serial"),
            VariantSpec::new("c-mat-mul-parallel", "C Parallel (OpenMP)", "c_mat_mul_parallel"),
        ],
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        let mut config = Self {
            axes: vec![
                SweepAxis::new("LEN", 1, &LEN_VALUES),
                SweepAxis::new("MLEN", 1, &MLEN_VALUES),
            ],
            families: vec![sum_family(), matmul_family()],
            build: CommandSpec::new("cargo", &["build", "--release", "--quiet"]),
            run: CommandSpec::new("cargo", &["bench", "--quiet"]),
            marker: default_marker(),
            unit: default_unit(),
            output_dir: default_output_dir(),
        };
        config.order_keywords();
        config
    }
}

impl SweepConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: SweepConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.build.validate()?;
        self.run.validate()?;
        if self.marker.is_empty() || self.unit.is_empty() {
            return Err(Error::config("marker and unit must not be empty"));
        }
        self.plan().map(|_| ())
    }

    pub fn plan(&self) -> Result<SweepPlan> {
        SweepPlan::new(self.axes.clone(), self.families.clone())
    }

    pub fn extractor(&self) -> Result<Extractor> {
        Extractor::new(&self.marker, &self.unit)
    }

    pub fn runner(&self) -> CommandRunner {
        CommandRunner::new(self.build.clone(), self.run.clone())
    }

    /// Moves every variant whose keyword contains another variant's keyword
    /// in front of it, so that e.g. `c_parallel_sum` is tried before
    /// `parallel_sum`. Relative order is otherwise kept.
    pub fn order_keywords(&mut self) {
        for family in &mut self.families {
            let mut ordered: Vec<VariantSpec> = Vec::with_capacity(family.variants.len());
            for variant in family.variants.drain(..) {
                let pos = ordered
                    .iter()
                    .position(|earlier| variant.keyword.contains(&earlier.keyword))
                    .unwrap_or(ordered.len());
                ordered.insert(pos, variant);
            }
            family.variants = ordered;
        }
    }
}
