//! Ordered keyword table mapping result lines to benchmark variants.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One measured implementation, recognized by a keyword on its result line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub id: String,
    /// Human-readable name for tables and chart legends.
    #[serde(default)]
    pub label: String,
    /// Literal substring of the benchmark name printed by the harness.
    pub keyword: String,
}

impl VariantSpec {
    pub fn new(id: &str, label: &str, keyword: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            keyword: keyword.to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    fn matches(&self, line: &str) -> bool {
        line.contains(&self.keyword)
    }
}

/// Result of classifying a result line against a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    Known(&'a VariantSpec),
    Unrecognized,
}

/// The set of variants measured along one sweep axis.
///
/// Variants are tried in declaration order and the first keyword found in
/// the line wins, so a keyword that is contained in another one must be
/// declared after it. [`VariantFamily::validate`] rejects tables where that
/// is not the case.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VariantFamily {
    pub name: String,
    /// Name of the sweep axis this family is measured along.
    pub axis: String,
    /// Variant id used as the numerator of every speedup ratio.
    pub baseline: String,
    pub variants: Vec<VariantSpec>,
}

impl VariantFamily {
    pub fn classify(&self, line: &str) -> Classification<'_> {
        self.variants
            .iter()
            .find(|variant| variant.matches(line))
            .map_or(Classification::Unrecognized, Classification::Known)
    }

    pub fn variant(&self, id: &str) -> Option<&VariantSpec> {
        self.variants.iter().find(|variant| variant.id == id)
    }

    pub fn baseline(&self) -> Option<&VariantSpec> {
        self.variant(&self.baseline)
    }

    /// Every variant except the baseline, in declaration order.
    pub fn comparisons(&self) -> impl Iterator<Item = &VariantSpec> {
        self.variants
            .iter()
            .filter(move |variant| variant.id != self.baseline)
    }

    pub fn validate(&self) -> Result<()> {
        if self.variants.is_empty() {
            return Err(Error::config(format!("family '{}' declares no variants", self.name)));
        }

        for (i, variant) in self.variants.iter().enumerate() {
            if variant.id.is_empty() {
                return Err(Error::config(format!("family '{}' has a variant without id", self.name)));
            }
            if variant.keyword.is_empty() {
                return Err(Error::config(format!(
                    "variant '{}' in family '{}' has an empty keyword",
                    variant.id, self.name
                )));
            }
            if self.variants[..i].iter().any(|earlier| earlier.id == variant.id) {
                return Err(Error::config(format!(
                    "variant '{}' declared twice in family '{}'",
                    variant.id, self.name
                )));
            }
            if let Some(earlier) = self.variants[..i]
                .iter()
                .find(|earlier| variant.keyword.contains(&earlier.keyword))
            {
                return Err(Error::config(format!(
                    "variant '{}' can never match in family '{}': its keyword '{}' contains '{}' of '{}', which is tried first",
                    variant.id, self.name, variant.keyword, earlier.keyword, earlier.id
                )));
            }
        }

        if self.baseline().is_none() {
            return Err(Error::config(format!(
                "baseline '{}' is not a variant of family '{}'",
                self.baseline, self.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_family() -> VariantFamily {
        VariantFamily {
            name: "sum".to_string(),
            axis: "LEN".to_string(),
            baseline: "serial".to_string(),
            variants: vec![
                VariantSpec::new("c-parallel", "C Parallel", "c_parallel_sum"),
                VariantSpec::new("c-serial", "C Serial", "c_serial_sum"),
                VariantSpec::new("parallel", "Parallel", "parallel_sum"),
                VariantSpec::new("serial", "Serial", "serial_sum"),
            ],
        }
    }

    #[test]
    fn longer_keyword_wins_over_embedded_one() {
        let family = sum_family();
        let line = "test tests::benchmark_c_parallel_sum ... bench: 10 ns/iter";
        match family.classify(line) {
            Classification::Known(variant) => assert_eq!(variant.id, "c-parallel"),
            Classification::Unrecognized => panic!("line was not classified"),
        }

        let line = "test tests::benchmark_parallel_sum ... bench: 10 ns/iter";
        match family.classify(line) {
            Classification::Known(variant) => assert_eq!(variant.id, "parallel"),
            Classification::Unrecognized => panic!("line was not classified"),
        }
    }

    #[test]
    fn unknown_benchmark_is_unrecognized() {
        let family = sum_family();
        let line = "test tests::benchmark_prefix_scan ... bench: 10 ns/iter";
        assert_eq!(family.classify(line), Classification::Unrecognized);
    }

    #[test]
    fn validate_rejects_shadowed_keyword() {
        let mut family = sum_family();
        family.variants.swap(0, 2);
        let err = family.validate().unwrap_err().to_string();
        assert!(err.contains("c-parallel"), "{err}");
    }

    #[test]
    fn validate_rejects_unknown_baseline() {
        let mut family = sum_family();
        family.baseline = "thread4".to_string();
        assert!(family.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let mut family = sum_family();
        family.variants.push(VariantSpec::new("serial", "", "serial_again"));
        assert!(family.validate().is_err());
    }

    #[test]
    fn comparisons_skip_baseline() {
        let family = sum_family();
        let ids: Vec<_> = family.comparisons().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["c-parallel", "c-serial", "parallel"]);
        assert!(family.validate().is_ok());
    }

    #[test]
    fn label_falls_back_to_id() {
        assert_eq!(VariantSpec::new("serial", "", "serial_sum").display_name(), "serial");
        assert_eq!(VariantSpec::new("serial", "Serial", "serial_sum").display_name(), "Serial");
    }
}
