use std::collections::BTreeMap;

use cohort_core::{
    AdmissionId, CohortConfig, CultureFlags, Encounter, MicrobiologyResult, TimeWindow,
};
use tracing::debug;

/// Positive cultures of the designated specimen type, grouped by admission.
#[derive(Debug, Default)]
pub struct CultureIndex<'a> {
    by_admission: BTreeMap<AdmissionId, Vec<&'a MicrobiologyResult>>,
}

impl<'a> CultureIndex<'a> {
    pub fn build(results: &'a [MicrobiologyResult], config: &CohortConfig) -> Self {
        let mut by_admission: BTreeMap<AdmissionId, Vec<&'a MicrobiologyResult>> = BTreeMap::new();
        for result in results {
            let Some(hadm_id) = result.hadm_id else {
                continue;
            };
            if is_qualifying_culture(result, config) {
                by_admission.entry(hadm_id).or_default().push(result);
            }
        }
        debug!(
            admissions = by_admission.len(),
            "indexed positive cultures"
        );
        Self { by_admission }
    }

    /// Both culture tiers for one encounter. Only `within_window` feeds exclusion.
    pub fn flags_for(&self, encounter: &Encounter, window: &TimeWindow) -> CultureFlags {
        let Some(results) = self.by_admission.get(&encounter.hadm_id) else {
            return CultureFlags::default();
        };
        CultureFlags {
            any_time: !results.is_empty(),
            within_window: results
                .iter()
                .filter_map(|result| result.charted_at)
                .any(|charted_at| window.contains(charted_at)),
        }
    }
}

pub fn is_qualifying_culture(result: &MicrobiologyResult, config: &CohortConfig) -> bool {
    let specimen_matches = result
        .specimen
        .to_uppercase()
        .contains(&config.culture_specimen.to_uppercase());
    let organism_named = result.organism.as_deref().map_or(false, |organism| {
        let organism = organism.trim();
        !organism.is_empty() && !organism.eq_ignore_ascii_case(&config.unspecified_organism)
    });
    specimen_matches && organism_named
}
