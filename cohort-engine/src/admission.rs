use chrono::NaiveDateTime;
use cohort_core::{derived::floor_hours, CohortConfig, Encounter};
use tracing::debug;

/// An encounter of the designated unit with its length of stay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitEncounter<'a> {
    pub encounter: &'a Encounter,
    pub los_hours: i64,
}

/// Keep encounters whose care unit matches the configured unit exactly.
pub fn select_unit_encounters<'a>(
    encounters: &'a [Encounter],
    config: &CohortConfig,
) -> Vec<UnitEncounter<'a>> {
    let selected: Vec<UnitEncounter<'a>> = encounters
        .iter()
        .filter(|encounter| encounter.care_unit == config.care_unit)
        .map(|encounter| UnitEncounter {
            encounter,
            los_hours: length_of_stay_hours(encounter.intime, encounter.outtime),
        })
        .collect();

    debug!(
        care_unit = %config.care_unit,
        total = encounters.len(),
        selected = selected.len(),
        "selected unit encounters"
    );
    selected
}

/// Whole hours between admission and discharge, floored.
pub fn length_of_stay_hours(intime: NaiveDateTime, outtime: NaiveDateTime) -> i64 {
    floor_hours(outtime.signed_duration_since(intime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, encounter};

    #[test]
    fn filters_by_exact_unit_name() {
        let mut other = encounter(2, 20, 12);
        other.care_unit = "Coronary Care Unit (CCU) ".to_string();
        let encounters = vec![encounter(1, 10, 12), other];

        let selected = select_unit_encounters(&encounters, &CohortConfig::default());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].encounter.stay_id, 1);
        assert_eq!(selected[0].los_hours, 12);
    }

    #[test]
    fn empty_when_unit_absent() {
        let mut config = CohortConfig::default();
        config.care_unit = "Neuro Intermediate".to_string();
        assert!(select_unit_encounters(&[encounter(1, 10, 12)], &config).is_empty());
    }

    #[test]
    fn length_of_stay_floors_partial_hours() {
        assert_eq!(length_of_stay_hours(at(1, 8, 0), at(1, 15, 59)), 7);
        assert_eq!(length_of_stay_hours(at(1, 8, 0), at(1, 16, 0)), 8);
        assert_eq!(length_of_stay_hours(at(1, 8, 0), at(1, 7, 30)), -1);
    }
}
