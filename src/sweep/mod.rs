//! Sweep axes and the configurations they expand into.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::variant::VariantFamily;

/// One independently varied size parameter.
///
/// `name` doubles as the environment variable handed to the build and
/// benchmark commands.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SweepAxis {
    pub name: String,
    /// Value used while some other axis is under test.
    #[serde(default = "default_neutral")]
    pub neutral: u64,
    pub values: Vec<u64>,
}

fn default_neutral() -> u64 {
    1
}

impl SweepAxis {
    pub fn new(name: &str, neutral: u64, values: &[u64]) -> Self {
        Self {
            name: name.to_string(),
            neutral,
            values: values.to_vec(),
        }
    }

    pub fn position(&self, value: u64) -> Option<usize> {
        self.values.iter().position(|&v| v == value)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("axis without name"));
        }
        if self.values.is_empty() {
            return Err(Error::config(format!("axis '{}' has no values", self.name)));
        }
        if self.neutral == 0 {
            return Err(Error::config(format!("axis '{}' has a zero neutral value", self.name)));
        }
        for (i, &value) in self.values.iter().enumerate() {
            if value == 0 {
                return Err(Error::config(format!("axis '{}' contains zero", self.name)));
            }
            if self.values[..i].contains(&value) {
                return Err(Error::config(format!(
                    "axis '{}' lists {} more than once",
                    self.name, value
                )));
            }
        }
        Ok(())
    }
}

/// Environment variables set for one build + run.
pub type EnvOverlay = BTreeMap<String, String>;

/// A single point of the sweep: one axis pinned to one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub axis: String,
    pub value: u64,
    pub env: EnvOverlay,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.axis, self.value)
    }
}

/// Axes to sweep, each paired with the variants measured along it.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    axes: Vec<SweepAxis>,
    families: Vec<VariantFamily>,
}

impl SweepPlan {
    /// Validates and pairs every family with its axis. Axes that no family
    /// measures are still pinned to their neutral value during the sweep.
    pub fn new(axes: Vec<SweepAxis>, families: Vec<VariantFamily>) -> Result<Self> {
        for (i, axis) in axes.iter().enumerate() {
            axis.validate()?;
            if axes[..i].iter().any(|other| other.name == axis.name) {
                return Err(Error::config(format!("axis '{}' declared twice", axis.name)));
            }
        }
        for (i, family) in families.iter().enumerate() {
            family.validate()?;
            if families[..i].iter().any(|other| other.name == family.name) {
                return Err(Error::config(format!("family '{}' declared twice", family.name)));
            }
            if !axes.iter().any(|axis| axis.name == family.axis) {
                return Err(Error::config(format!(
                    "family '{}' refers to unknown axis '{}'",
                    family.name, family.axis
                )));
            }
        }
        if families.is_empty() {
            return Err(Error::config("nothing to sweep: no variant families"));
        }
        Ok(Self { axes, families })
    }

    pub fn axes(&self) -> &[SweepAxis] {
        &self.axes
    }

    pub fn families(&self) -> &[VariantFamily] {
        &self.families
    }

    pub fn axis(&self, name: &str) -> Option<&SweepAxis> {
        self.axes.iter().find(|axis| axis.name == name)
    }

    /// Families in declaration order, each with the axis it is swept along.
    pub fn pairs(&self) -> impl Iterator<Item = (&SweepAxis, &VariantFamily)> {
        self.families
            .iter()
            .filter_map(move |family| self.axis(&family.axis).map(|axis| (axis, family)))
    }

    /// Configurations for one axis, in the axis' order. Every other axis
    /// is set to its neutral value.
    pub fn configurations(&self, axis: &SweepAxis) -> Vec<Configuration> {
        axis.values
            .iter()
            .map(|&value| {
                let env = self
                    .axes
                    .iter()
                    .map(|other| {
                        let v = if other.name == axis.name { value } else { other.neutral };
                        (other.name.clone(), v.to_string())
                    })
                    .collect();
                Configuration {
                    axis: axis.name.clone(),
                    value,
                    env,
                }
            })
            .collect()
    }
}
