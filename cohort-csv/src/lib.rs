//! CSV extract reader and cohort table writer.
//!
//! An extract directory holds one CSV file per source relation, named after
//! the upstream tables (`icustays.csv`, `diagnoses_icd.csv`, ...). Columns not
//! used by the pipeline are ignored.

mod rows;
pub mod timestamp;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cohort_core::{CohortError, CohortRow, Measurement, SourceSnapshot};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::rows::{
    ChartEventRow, DiagnosisRow, IcuStayRow, InputEventRow, LabEventRow, MicrobiologyRow,
    NoteRow, PatientRow,
};

pub const ENCOUNTERS_FILE: &str = "icustays.csv";
pub const DIAGNOSES_FILE: &str = "diagnoses_icd.csv";
pub const VITALS_FILE: &str = "chartevents.csv";
pub const LABS_FILE: &str = "labevents.csv";
pub const MEDICATIONS_FILE: &str = "inputevents.csv";
pub const MICROBIOLOGY_FILE: &str = "microbiologyevents.csv";
pub const NOTES_FILE: &str = "discharge.csv";
pub const DEMOGRAPHICS_FILE: &str = "patients.csv";

/// Load every source relation from `dir`.
pub fn load_snapshot(dir: impl AsRef<Path>) -> Result<SourceSnapshot, CohortError> {
    let dir = dir.as_ref();

    let encounters = read_relation::<IcuStayRow>(&dir.join(ENCOUNTERS_FILE))?
        .into_iter()
        .map(Into::into)
        .collect();
    let diagnoses = read_relation::<DiagnosisRow>(&dir.join(DIAGNOSES_FILE))?
        .into_iter()
        .map(Into::into)
        .collect();
    let vitals = read_relation::<ChartEventRow>(&dir.join(VITALS_FILE))?
        .into_iter()
        .map(Into::into)
        .collect();

    let lab_rows = read_relation::<LabEventRow>(&dir.join(LABS_FILE))?;
    let lab_total = lab_rows.len();
    let labs: Vec<Measurement> = lab_rows
        .into_iter()
        .filter(LabEventRow::is_linked)
        .map(Into::into)
        .collect();
    if labs.len() < lab_total {
        debug!(
            skipped = lab_total - labs.len(),
            "lab rows without admission dropped"
        );
    }

    let medications = read_relation::<InputEventRow>(&dir.join(MEDICATIONS_FILE))?
        .into_iter()
        .map(Into::into)
        .collect();
    let microbiology = read_relation::<MicrobiologyRow>(&dir.join(MICROBIOLOGY_FILE))?
        .into_iter()
        .map(Into::into)
        .collect();
    let notes = read_relation::<NoteRow>(&dir.join(NOTES_FILE))?
        .into_iter()
        .filter_map(NoteRow::into_note)
        .collect();
    let demographics = read_relation::<PatientRow>(&dir.join(DEMOGRAPHICS_FILE))?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(SourceSnapshot {
        encounters,
        diagnoses,
        vitals,
        labs,
        medications,
        microbiology,
        notes,
        demographics,
    })
}

fn read_relation<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CohortError> {
    if !path.is_file() {
        return Err(CohortError::MissingRelation(path.display().to_string()));
    }
    let rows = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .and_then(|reader| reader.into_deserialize().collect::<Result<Vec<T>, _>>())
        .map_err(|err| parse_error(path, err))?;
    info!(relation = %path.display(), rows = rows.len(), "loaded relation");
    Ok(rows)
}

fn parse_error(path: &Path, err: csv::Error) -> CohortError {
    CohortError::Parse(format!("{}: {err}", path.display()))
}

/// Write cohort rows as CSV with a header line.
pub fn write_cohort<W: io::Write>(writer: W, rows: &[CohortRow]) -> Result<(), CohortError> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)
            .map_err(|err| CohortError::Parse(format!("cohort row {}: {err}", row.stay_id)))?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_cohort_file(
    path: impl AsRef<Path>,
    rows: &[CohortRow],
) -> Result<PathBuf, CohortError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_cohort(io::BufWriter::new(fs::File::create(path)?), rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote cohort");
    Ok(path.to_path_buf())
}

/// Read a cohort table previously produced by [`write_cohort`].
pub fn read_cohort<R: io::Read>(reader: R) -> Result<Vec<CohortRow>, CohortError> {
    csv::Reader::from_reader(reader)
        .into_deserialize()
        .collect::<Result<Vec<CohortRow>, _>>()
        .map_err(|err| CohortError::Parse(format!("cohort table: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cohort-csv-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, file: &str, body: &str) {
        fs::write(dir.join(file), body).unwrap();
    }

    fn minimal_extract(dir: &Path) {
        write(
            dir,
            ENCOUNTERS_FILE,
            "subject_id,hadm_id,stay_id,first_careunit,intime,outtime\n\
             1,10,100,Coronary Care Unit (CCU),2150-01-01 08:00:00,2150-01-02 08:00:00\n",
        );
        write(dir, DIAGNOSES_FILE, "hadm_id,icd_code\n10,I21.4\n");
        write(
            dir,
            VITALS_FILE,
            "stay_id,itemid,charttime,valuenum\n100,220050,2150-01-01 09:00:00,\n",
        );
        write(
            dir,
            LABS_FILE,
            "subject_id,hadm_id,itemid,charttime,valuenum\n\
             1,10,50813,2150-01-01 09:00:00,2.4\n\
             1,,50813,2150-01-01 09:00:00,9.9\n",
        );
        write(dir, MEDICATIONS_FILE, "stay_id,itemid,starttime,endtime,rate\n");
        write(
            dir,
            MICROBIOLOGY_FILE,
            "subject_id,hadm_id,chartdate,charttime,spec_type_desc,org_name\n\
             1,10,2150-01-01,,BLOOD CULTURE,\n",
        );
        write(
            dir,
            NOTES_FILE,
            "note_id,hadm_id,text\nn1,10,\"Shock, cardiogenic; see above\"\n",
        );
        write(
            dir,
            DEMOGRAPHICS_FILE,
            "subject_id,gender,anchor_age,anchor_year,dod\n1,F,50,2148,\n",
        );
    }

    #[test]
    fn loads_minimal_extract() {
        let dir = scratch_dir("minimal");
        minimal_extract(&dir);

        let snapshot = load_snapshot(&dir).unwrap();
        assert_eq!(snapshot.encounters.len(), 1);
        assert_eq!(snapshot.diagnoses[0].code, "I214");
        assert_eq!(snapshot.vitals[0].value, None);
        assert_eq!(snapshot.labs.len(), 1);
        assert_eq!(snapshot.microbiology[0].organism, None);
        assert_eq!(
            snapshot.microbiology[0].charted_at.map(|t| t.to_string()),
            Some("2150-01-01 00:00:00".to_string())
        );
        assert_eq!(snapshot.notes[0].text, "Shock, cardiogenic; see above");
        assert_eq!(snapshot.demographics[0].age_at(snapshot.encounters[0].intime), 52);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = scratch_dir("missing");
        minimal_extract(&dir);
        fs::remove_file(dir.join(NOTES_FILE)).unwrap();

        match load_snapshot(&dir) {
            Err(CohortError::MissingRelation(path)) => assert!(path.ends_with(NOTES_FILE)),
            other => panic!("expected missing relation, got {other:?}"),
        }
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn bad_timestamp_is_a_parse_error() {
        let dir = scratch_dir("badtime");
        minimal_extract(&dir);
        write(
            &dir,
            ENCOUNTERS_FILE,
            "subject_id,hadm_id,stay_id,first_careunit,intime,outtime\n\
             1,10,100,Coronary Care Unit (CCU),yesterday,2150-01-02 08:00:00\n",
        );
        match load_snapshot(&dir) {
            Err(CohortError::Parse(msg)) => assert!(msg.contains(ENCOUNTERS_FILE)),
            other => panic!("expected parse error, got {other:?}"),
        }
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn bad_optional_timestamp_keeps_row() {
        let dir = scratch_dir("badoptional");
        minimal_extract(&dir);
        write(
            &dir,
            MICROBIOLOGY_FILE,
            "subject_id,hadm_id,chartdate,charttime,spec_type_desc,org_name\n\
             1,10,2150-01-01,soon,BLOOD CULTURE,E. COLI\n",
        );
        write(
            &dir,
            MEDICATIONS_FILE,
            "stay_id,itemid,starttime,endtime,rate\n\
             100,221906,2150-01-01 09:00:00,later,0.1\n",
        );

        let snapshot = load_snapshot(&dir).unwrap();
        assert_eq!(
            snapshot.microbiology[0].charted_at.map(|t| t.to_string()),
            Some("2150-01-01 00:00:00".to_string())
        );
        assert_eq!(snapshot.medications.len(), 1);
        assert_eq!(snapshot.medications[0].ended_at, None);
        fs::remove_dir_all(dir).ok();
    }
}
