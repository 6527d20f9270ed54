use std::collections::BTreeMap;

use cohort_core::{
    CohortConfig, CohortError, CohortRow, Demographics, EncounterProfile, Outcome,
    SourceSnapshot, SubjectId, TimeWindow,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::admission::select_unit_encounters;
use crate::attrition::AttritionReport;
use crate::criteria::{self, CriteriaSources};
use crate::diagnosis::{assign_etiology, DiagnosisIndex};
use crate::documentation::DocumentationIndex;
use crate::exclusion::CultureIndex;
use crate::summary::CohortSummary;

/// One inclusion predicate applied after the unit filter.
pub struct Stage {
    pub name: &'static str,
    pub describe: fn(&CohortConfig) -> String,
    pub keep: fn(&EncounterProfile, &CohortConfig) -> bool,
}

static STAGES: [Stage; 5] = [
    Stage {
        name: "adult",
        describe: |config| format!("age >= {}", config.min_age),
        keep: |profile, config| profile.age.map_or(false, |age| age >= config.min_age),
    },
    Stage {
        name: "length_of_stay",
        describe: |config| format!("length of stay >= {}h", config.min_los_hours),
        keep: |profile, config| profile.los_hours >= config.min_los_hours,
    },
    Stage {
        name: "cardiac_diagnosis",
        describe: |_| "any cardiac diagnosis".to_string(),
        keep: |profile, _| profile.has_cardiac_diagnosis(),
    },
    Stage {
        name: "shock_evidence",
        describe: |config| format!("documented shock or >= {} criteria", config.min_criteria),
        keep: |profile, config| {
            profile.documented || profile.criteria.count() >= config.min_criteria
        },
    },
    Stage {
        name: "culture_exclusion",
        describe: |config| {
            format!(
                "no undocumented positive culture within {}h",
                config.window_hours
            )
        },
        keep: |profile, _| !profile.culture_excluded(),
    },
];

/// Inclusion stages in evaluation order. The cohort is the set of profiles
/// passing all of them.
pub fn stages() -> &'static [Stage] {
    &STAGES
}

pub fn is_included(profile: &EncounterProfile, config: &CohortConfig) -> bool {
    stages().iter().all(|stage| (stage.keep)(profile, config))
}

/// Derive every flag for each encounter of the designated unit, sorted by stay.
pub fn profile_encounters(
    snapshot: &SourceSnapshot,
    config: &CohortConfig,
) -> Result<Vec<EncounterProfile>, CohortError> {
    config.validate()?;

    let documentation = DocumentationIndex::build(&snapshot.diagnoses, &snapshot.notes, config);
    let diagnoses = DiagnosisIndex::build(&snapshot.diagnoses);
    let measurements = CriteriaSources::build(snapshot);
    let cultures = CultureIndex::build(&snapshot.microbiology, config);
    let demographics: BTreeMap<SubjectId, &Demographics> = snapshot
        .demographics
        .iter()
        .map(|demo| (demo.subject_id, demo))
        .collect();

    let mut missing_demographics = 0usize;
    let mut profiles = Vec::new();
    for unit in select_unit_encounters(&snapshot.encounters, config) {
        let encounter = unit.encounter;
        let window = TimeWindow::anchored(encounter.intime, config.window_hours);
        let demo = demographics.get(&encounter.subject_id).copied();
        if demo.is_none() {
            missing_demographics += 1;
        }

        let categories = diagnoses.flags_for(encounter.hadm_id);
        let profile = EncounterProfile {
            encounter: encounter.clone(),
            los_hours: unit.los_hours,
            age: demo.map(|demo| demo.age_at(encounter.intime)),
            gender: demo.and_then(|demo| demo.gender.clone()),
            categories,
            etiology: assign_etiology(&categories),
            criteria: criteria::evaluate(encounter, &window, &measurements, config),
            culture: cultures.flags_for(encounter, &window),
            documented: documentation.is_documented(encounter.hadm_id),
            outcome: Outcome::from_death(encounter.intime, demo.and_then(|demo| demo.dod)),
        };
        profile.check_invariants()?;
        profiles.push(profile);
    }

    if missing_demographics > 0 {
        warn!(
            count = missing_demographics,
            "unit encounters without demographics; treated as age unknown"
        );
    }

    profiles.sort_by_key(|profile| profile.encounter.stay_id);
    debug!(profiles = profiles.len(), "profiled unit encounters");
    Ok(profiles)
}

/// Rows of every profile passing all inclusion stages.
pub fn assemble(profiles: &[EncounterProfile], config: &CohortConfig) -> Vec<CohortRow> {
    profiles
        .iter()
        .filter(|profile| is_included(profile, config))
        .map(CohortRow::from)
        .collect()
}

/// Result of a full pipeline run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CohortRun {
    pub cohort: Vec<CohortRow>,
    pub attrition: AttritionReport,
    pub summary: CohortSummary,
}

pub fn derive_cohort(
    snapshot: &SourceSnapshot,
    config: &CohortConfig,
) -> Result<CohortRun, CohortError> {
    let profiles = profile_encounters(snapshot, config)?;
    let cohort = assemble(&profiles, config);
    let attrition = AttritionReport::from_profiles(snapshot.encounters.len(), &profiles, config);
    let summary = CohortSummary::from_rows(&cohort);

    info!(
        encounters = snapshot.encounters.len(),
        unit_encounters = profiles.len(),
        cohort = cohort.len(),
        "derived cohort"
    );
    Ok(CohortRun {
        cohort,
        attrition,
        summary,
    })
}
