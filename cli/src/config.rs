//! Partial configuration documents merged onto the defaults.

use std::path::Path;

use anyhow::Context;
use cohort_core::{CohortConfig, VasopressorAgent};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default)]
    care_unit: Option<String>,
    #[serde(default)]
    window_hours: Option<u32>,
    #[serde(default)]
    icd9_documentation_code: Option<String>,
    #[serde(default)]
    icd10_documentation_code: Option<String>,
    #[serde(default)]
    documentation_phrase: Option<String>,
    #[serde(default)]
    hypotension_concepts: Option<Vec<i64>>,
    #[serde(default)]
    hypotension_below: Option<f64>,
    #[serde(default)]
    lactate_concepts: Option<Vec<i64>>,
    #[serde(default)]
    lactate_at_least: Option<f64>,
    #[serde(default)]
    vasopressors: Option<Vec<VasopressorAgent>>,
    #[serde(default)]
    culture_specimen: Option<String>,
    #[serde(default)]
    unspecified_organism: Option<String>,
    #[serde(default)]
    min_age: Option<i32>,
    #[serde(default)]
    min_los_hours: Option<i64>,
    #[serde(default)]
    min_criteria: Option<u8>,
}

impl From<ConfigOverrides> for CohortConfig {
    fn from(cfg: ConfigOverrides) -> Self {
        let mut base = CohortConfig::default();
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = cfg.$field {
                    base.$field = value;
                })*
            };
        }
        apply!(
            care_unit,
            window_hours,
            icd9_documentation_code,
            icd10_documentation_code,
            documentation_phrase,
            hypotension_concepts,
            hypotension_below,
            lactate_concepts,
            lactate_at_least,
            vasopressors,
            culture_specimen,
            unspecified_organism,
            min_age,
            min_los_hours,
            min_criteria,
        );
        base
    }
}

/// Build the run configuration from an optional override file and the
/// command line unit override, then validate it.
pub fn resolve(path: Option<&Path>, care_unit: Option<String>) -> anyhow::Result<CohortConfig> {
    let overrides = match path {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("could not read config {}", path.display()))?;
            serde_json::from_str::<ConfigOverrides>(&data)
                .with_context(|| format!("could not parse config {}", path.display()))?
        }
        None => ConfigOverrides::default(),
    };

    let mut config = CohortConfig::from(overrides);
    if let Some(unit) = care_unit {
        config.care_unit = unit;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let overrides: ConfigOverrides = serde_json::from_str("{}").unwrap();
        assert_eq!(CohortConfig::from(overrides), CohortConfig::default());
    }

    #[test]
    fn fields_override_individually() {
        let overrides: ConfigOverrides =
            serde_json::from_str(r#"{"window_hours": 48, "min_criteria": 3}"#).unwrap();
        let config = CohortConfig::from(overrides);
        assert_eq!(config.window_hours, 48);
        assert_eq!(config.min_criteria, 3);
        assert_eq!(config.care_unit, CohortConfig::default().care_unit);
    }

    #[test]
    fn oversized_window_fails_validation() {
        let overrides: ConfigOverrides =
            serde_json::from_str(r#"{"window_hours": 4294967295}"#).unwrap();
        let config = CohortConfig::from(overrides);
        assert_eq!(config.window_hours, u32::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<ConfigOverrides>(r#"{"windowHours": 48}"#).is_err());
    }

    #[test]
    fn command_line_unit_wins_and_is_validated() {
        let config = resolve(None, Some("Cardiac Vascular Intensive Care Unit (CVICU)".into()))
            .unwrap();
        assert_eq!(config.care_unit, "Cardiac Vascular Intensive Care Unit (CVICU)");
        assert!(resolve(None, Some(String::new())).is_err());
    }
}
