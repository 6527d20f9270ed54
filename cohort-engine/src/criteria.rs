use std::collections::BTreeMap;

use cohort_core::{
    AdmissionId, CohortConfig, CriteriaFlags, Encounter, Measurement, SourceSnapshot, StayId,
    TimeWindow,
};

/// Measurements grouped by the stay or admission they were recorded against.
#[derive(Debug, Default)]
pub struct MeasurementIndex<'a> {
    by_stay: BTreeMap<StayId, Vec<&'a Measurement>>,
    by_admission: BTreeMap<AdmissionId, Vec<&'a Measurement>>,
}

impl<'a> MeasurementIndex<'a> {
    pub fn build(rows: &'a [Measurement]) -> Self {
        let mut index = Self::default();
        for row in rows {
            match (row.owner.stay_id, row.owner.hadm_id) {
                (Some(stay_id), _) => index.by_stay.entry(stay_id).or_default().push(row),
                (None, Some(hadm_id)) => index.by_admission.entry(hadm_id).or_default().push(row),
                (None, None) => {}
            }
        }
        index
    }

    /// Rows of this stay plus admission-level rows not tied to any stay.
    pub fn for_encounter(
        &self,
        encounter: &Encounter,
    ) -> impl Iterator<Item = &'a Measurement> + '_ {
        let own = self.by_stay.get(&encounter.stay_id);
        let shared = self.by_admission.get(&encounter.hadm_id);
        own.into_iter()
            .chain(shared)
            .flat_map(|rows| rows.iter().copied())
    }
}

/// Indexes over the three measurement relations.
#[derive(Debug, Default)]
pub struct CriteriaSources<'a> {
    pub vitals: MeasurementIndex<'a>,
    pub labs: MeasurementIndex<'a>,
    pub medications: MeasurementIndex<'a>,
}

impl<'a> CriteriaSources<'a> {
    pub fn build(snapshot: &'a SourceSnapshot) -> Self {
        Self {
            vitals: MeasurementIndex::build(&snapshot.vitals),
            labs: MeasurementIndex::build(&snapshot.labs),
            medications: MeasurementIndex::build(&snapshot.medications),
        }
    }
}

/// Evaluate the three criteria inside `window`. Each criterion collapses its
/// qualifying rows to one boolean before they are counted together.
pub fn evaluate(
    encounter: &Encounter,
    window: &TimeWindow,
    sources: &CriteriaSources<'_>,
    config: &CohortConfig,
) -> CriteriaFlags {
    CriteriaFlags {
        hypotension: sources
            .vitals
            .for_encounter(encounter)
            .any(|row| is_hypotensive(row, window, config)),
        vasopressor: sources
            .medications
            .for_encounter(encounter)
            .any(|row| is_vasopressor_exposure(row, window, config)),
        lactate: sources
            .labs
            .for_encounter(encounter)
            .any(|row| is_elevated_lactate(row, window, config)),
    }
}

pub fn is_hypotensive(row: &Measurement, window: &TimeWindow, config: &CohortConfig) -> bool {
    config.hypotension_concepts.contains(&row.concept_id)
        && window.contains(row.recorded_at)
        && row
            .value
            .map_or(false, |value| value > 0.0 && value < config.hypotension_below)
}

pub fn is_elevated_lactate(
    row: &Measurement,
    window: &TimeWindow,
    config: &CohortConfig,
) -> bool {
    config.lactate_concepts.contains(&row.concept_id)
        && window.contains(row.recorded_at)
        && row
            .value
            .map_or(false, |value| value >= config.lactate_at_least)
}

pub fn is_vasopressor_exposure(
    row: &Measurement,
    window: &TimeWindow,
    config: &CohortConfig,
) -> bool {
    let Some(agent) = config.vasopressor(row.concept_id) else {
        return false;
    };
    row.recorded_at <= window.end && agent.accepts(row.value)
}
