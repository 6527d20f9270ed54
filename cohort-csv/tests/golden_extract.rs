use std::fs;

use cohort_core::{CohortConfig, Etiology};
use cohort_csv::{load_snapshot, read_cohort, write_cohort};
use cohort_engine::derive_cohort;
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn attrition_matches_golden() {
    let snapshot = load_snapshot(fixture_path("extract")).expect("Không đọc được dữ liệu mẫu");
    let run = derive_cohort(&snapshot, &CohortConfig::default()).expect("Không dựng được cohort");

    let actual = serde_json::to_value(&run.attrition).expect("Không serialize attrition");
    let expected = fs::read_to_string(fixture_path("expected_attrition.json"))
        .expect("Không đọc được golden attrition");
    let expected: Value = serde_json::from_str(&expected).expect("Golden không hợp lệ");

    assert_eq!(actual, expected);
}

#[test]
fn cohort_matches_golden_table() {
    let snapshot = load_snapshot(fixture_path("extract")).expect("Không đọc được dữ liệu mẫu");
    let run = derive_cohort(&snapshot, &CohortConfig::default()).expect("Không dựng được cohort");

    let expected = fs::File::open(fixture_path("expected_cohort.csv"))
        .expect("Không mở được golden cohort");
    let expected = read_cohort(expected).expect("Golden cohort không hợp lệ");
    assert_eq!(run.cohort, expected);

    let etiologies: Vec<_> = run.cohort.iter().map(|row| row.etiology).collect();
    assert_eq!(
        etiologies,
        vec![
            Etiology::AmiCs,
            Etiology::HeartFailureCs,
            Etiology::CardiomyopathyCs
        ]
    );
}

#[test]
fn written_table_reads_back_unchanged() {
    let snapshot = load_snapshot(fixture_path("extract")).expect("Không đọc được dữ liệu mẫu");
    let run = derive_cohort(&snapshot, &CohortConfig::default()).expect("Không dựng được cohort");

    let mut buffer = Vec::new();
    write_cohort(&mut buffer, &run.cohort).expect("Không ghi được cohort");
    let text = String::from_utf8(buffer.clone()).expect("Cohort không phải UTF-8");
    assert!(text.starts_with("stay_id,subject_id,hadm_id,intime,outtime,los_hours,"));
    assert_eq!(text.lines().count(), run.cohort.len() + 1);

    assert_eq!(read_cohort(buffer.as_slice()).expect("Không đọc lại được cohort"), run.cohort);
}

#[test]
fn care_unit_override_changes_population() {
    let snapshot = load_snapshot(fixture_path("extract")).expect("Không đọc được dữ liệu mẫu");
    let config = CohortConfig {
        care_unit: "Medical Intensive Care Unit (MICU)".to_string(),
        ..CohortConfig::default()
    };
    let run = derive_cohort(&snapshot, &config).expect("Không dựng được cohort");

    let stays: Vec<_> = run.cohort.iter().map(|row| row.stay_id).collect();
    assert_eq!(stays, vec![5000]);
    assert_eq!(run.attrition.steps[1].remaining, 1);
}
