use std::fmt;

use cohort_core::{CohortConfig, EncounterProfile};
use serde::{Deserialize, Serialize};

use crate::assembler::stages;

/// Population remaining after one cumulative stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttritionStep {
    pub step: usize,
    pub name: String,
    pub description: String,
    pub remaining: usize,
    pub removed: usize,
}

/// Step-by-step population counts from the full extract down to the cohort.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttritionReport {
    pub steps: Vec<AttritionStep>,
}

impl AttritionReport {
    /// `total` is the size of the encounter relation before the unit filter;
    /// `profiles` are the unit encounters.
    pub fn from_profiles(
        total: usize,
        profiles: &[EncounterProfile],
        config: &CohortConfig,
    ) -> Self {
        let mut report = Self::default();
        report.push("all_encounters", "all encounters".to_string(), total);
        report.push(
            "care_unit",
            format!("first care unit is {}", config.care_unit),
            profiles.len(),
        );

        let mut surviving: Vec<&EncounterProfile> = profiles.iter().collect();
        for stage in stages() {
            surviving.retain(|profile| (stage.keep)(profile, config));
            report.push(stage.name, (stage.describe)(config), surviving.len());
        }
        report
    }

    fn push(&mut self, name: &str, description: String, remaining: usize) {
        let previous = self.steps.last().map_or(remaining, |step| step.remaining);
        self.steps.push(AttritionStep {
            step: self.steps.len(),
            name: name.to_string(),
            description,
            remaining,
            removed: previous.saturating_sub(remaining),
        });
    }

    pub fn final_count(&self) -> usize {
        self.steps.last().map_or(0, |step| step.remaining)
    }
}

impl fmt::Display for AttritionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .steps
            .iter()
            .map(|step| step.description.len())
            .max()
            .unwrap_or(0);
        writeln!(f, "{:>4}  {:<width$}  {:>9}  {:>8}", "step", "stage", "remaining", "removed")?;
        for step in &self.steps {
            writeln!(
                f,
                "{:>4}  {:<width$}  {:>9}  {:>8}",
                step.step, step.description, step.remaining, step.removed
            )?;
        }
        Ok(())
    }
}
