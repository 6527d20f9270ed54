//! Raw extract rows and their conversion into the core model.

use chrono::NaiveDateTime;
use cohort_core::{
    AdmissionId, Demographics, DiagnosisCode, Encounter, FreeTextNote, Measurement,
    MicrobiologyResult, RecordOwner, StayId, SubjectId,
};
use serde::Deserialize;

use crate::timestamp::{optional_timestamp, timestamp};

#[derive(Debug, Deserialize)]
pub(crate) struct IcuStayRow {
    subject_id: SubjectId,
    hadm_id: AdmissionId,
    stay_id: StayId,
    first_careunit: String,
    #[serde(deserialize_with = "timestamp")]
    intime: NaiveDateTime,
    #[serde(deserialize_with = "timestamp")]
    outtime: NaiveDateTime,
}

impl From<IcuStayRow> for Encounter {
    fn from(row: IcuStayRow) -> Self {
        Self {
            stay_id: row.stay_id,
            subject_id: row.subject_id,
            hadm_id: row.hadm_id,
            care_unit: row.first_careunit,
            intime: row.intime,
            outtime: row.outtime,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiagnosisRow {
    hadm_id: AdmissionId,
    icd_code: String,
    #[serde(default)]
    icd_version: Option<u8>,
}

impl From<DiagnosisRow> for DiagnosisCode {
    fn from(row: DiagnosisRow) -> Self {
        DiagnosisCode::new(row.hadm_id, &row.icd_code, row.icd_version)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartEventRow {
    #[serde(default)]
    hadm_id: Option<AdmissionId>,
    #[serde(default)]
    stay_id: Option<StayId>,
    itemid: i64,
    #[serde(deserialize_with = "timestamp")]
    charttime: NaiveDateTime,
    #[serde(default)]
    valuenum: Option<f64>,
}

impl From<ChartEventRow> for Measurement {
    fn from(row: ChartEventRow) -> Self {
        Measurement {
            owner: RecordOwner {
                stay_id: row.stay_id,
                hadm_id: row.hadm_id,
            },
            concept_id: row.itemid,
            recorded_at: row.charttime,
            ended_at: None,
            value: row.valuenum,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabEventRow {
    #[serde(default)]
    hadm_id: Option<AdmissionId>,
    itemid: i64,
    #[serde(deserialize_with = "timestamp")]
    charttime: NaiveDateTime,
    #[serde(default)]
    valuenum: Option<f64>,
}

impl LabEventRow {
    pub(crate) fn is_linked(&self) -> bool {
        self.hadm_id.is_some()
    }
}

impl From<LabEventRow> for Measurement {
    fn from(row: LabEventRow) -> Self {
        Measurement {
            owner: RecordOwner {
                stay_id: None,
                hadm_id: row.hadm_id,
            },
            concept_id: row.itemid,
            recorded_at: row.charttime,
            ended_at: None,
            value: row.valuenum,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InputEventRow {
    #[serde(default)]
    hadm_id: Option<AdmissionId>,
    #[serde(default)]
    stay_id: Option<StayId>,
    itemid: i64,
    #[serde(deserialize_with = "timestamp")]
    starttime: NaiveDateTime,
    #[serde(default, deserialize_with = "optional_timestamp")]
    endtime: Option<NaiveDateTime>,
    #[serde(default)]
    rate: Option<f64>,
}

impl From<InputEventRow> for Measurement {
    fn from(row: InputEventRow) -> Self {
        Measurement {
            owner: RecordOwner {
                stay_id: row.stay_id,
                hadm_id: row.hadm_id,
            },
            concept_id: row.itemid,
            recorded_at: row.starttime,
            ended_at: row.endtime,
            value: row.rate,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MicrobiologyRow {
    subject_id: SubjectId,
    #[serde(default)]
    hadm_id: Option<AdmissionId>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    chartdate: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    charttime: Option<NaiveDateTime>,
    #[serde(default)]
    spec_type_desc: Option<String>,
    #[serde(default)]
    org_name: Option<String>,
}

impl From<MicrobiologyRow> for MicrobiologyResult {
    fn from(row: MicrobiologyRow) -> Self {
        MicrobiologyResult {
            subject_id: row.subject_id,
            hadm_id: row.hadm_id,
            charted_at: row.charttime.or(row.chartdate),
            specimen: row.spec_type_desc.unwrap_or_default(),
            organism: row.org_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteRow {
    #[serde(default)]
    hadm_id: Option<AdmissionId>,
    #[serde(default)]
    text: Option<String>,
}

impl NoteRow {
    pub(crate) fn into_note(self) -> Option<FreeTextNote> {
        Some(FreeTextNote {
            hadm_id: self.hadm_id?,
            text: self.text?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatientRow {
    subject_id: SubjectId,
    #[serde(default)]
    gender: Option<String>,
    anchor_age: i32,
    anchor_year: i32,
    #[serde(default, deserialize_with = "optional_timestamp")]
    dod: Option<NaiveDateTime>,
}

impl From<PatientRow> for Demographics {
    fn from(row: PatientRow) -> Self {
        Demographics {
            subject_id: row.subject_id,
            gender: row.gender,
            anchor_age: row.anchor_age,
            anchor_year: row.anchor_year,
            dod: row.dod,
        }
    }
}
