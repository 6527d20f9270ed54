use chrono::{NaiveDate, NaiveDateTime};
use cohort_core::{
    Demographics, DiagnosisCode, Encounter, Measurement, MicrobiologyResult, RecordOwner,
};

pub const CCU: &str = "Coronary Care Unit (CCU)";

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2150, 3, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap()
}

pub fn encounter(stay_id: i64, hadm_id: i64, los_hours: i64) -> Encounter {
    let intime = at(1, 8, 0);
    Encounter {
        stay_id,
        subject_id: hadm_id / 10,
        hadm_id,
        care_unit: CCU.to_string(),
        intime,
        outtime: intime + chrono::Duration::hours(los_hours),
    }
}

pub fn dx(hadm_id: i64, code: &str) -> DiagnosisCode {
    DiagnosisCode::new(hadm_id, code, None)
}

pub fn charted(
    stay_id: i64,
    concept_id: i64,
    recorded_at: NaiveDateTime,
    value: f64,
) -> Measurement {
    Measurement {
        owner: RecordOwner {
            stay_id: Some(stay_id),
            hadm_id: None,
        },
        concept_id,
        recorded_at,
        ended_at: None,
        value: Some(value),
    }
}

pub fn lab(hadm_id: i64, concept_id: i64, recorded_at: NaiveDateTime, value: f64) -> Measurement {
    Measurement {
        owner: RecordOwner {
            stay_id: None,
            hadm_id: Some(hadm_id),
        },
        concept_id,
        recorded_at,
        ended_at: None,
        value: Some(value),
    }
}

pub fn infusion(
    stay_id: i64,
    concept_id: i64,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    rate: Option<f64>,
) -> Measurement {
    Measurement {
        owner: RecordOwner {
            stay_id: Some(stay_id),
            hadm_id: None,
        },
        concept_id,
        recorded_at: start,
        ended_at: end,
        value: rate,
    }
}

pub fn culture(
    hadm_id: i64,
    charted_at: NaiveDateTime,
    organism: Option<&str>,
) -> MicrobiologyResult {
    MicrobiologyResult {
        subject_id: hadm_id / 10,
        hadm_id: Some(hadm_id),
        charted_at: Some(charted_at),
        specimen: "BLOOD CULTURE".to_string(),
        organism: organism.map(str::to_string),
    }
}

pub fn adult(subject_id: i64, age: i32) -> Demographics {
    Demographics {
        subject_id,
        gender: Some("M".to_string()),
        anchor_age: age,
        anchor_year: 2150,
        dod: None,
    }
}
