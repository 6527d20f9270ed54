//! Các cờ suy ra cho từng lượt điều trị và dòng kết quả dựng từ chúng.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{AdmissionId, CohortError, Encounter, StayId, SubjectId};

/// Các nhóm chẩn đoán tim mạch, khai báo theo thứ tự ưu tiên nguyên nhân.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CardiacCategory {
    Ami,
    HeartFailure,
    Cardiomyopathy,
    Valvular,
    Arrhythmia,
}

impl CardiacCategory {
    pub const ALL: [CardiacCategory; 5] = [
        CardiacCategory::Ami,
        CardiacCategory::HeartFailure,
        CardiacCategory::Cardiomyopathy,
        CardiacCategory::Valvular,
        CardiacCategory::Arrhythmia,
    ];
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryFlags {
    pub ami: bool,
    pub heart_failure: bool,
    pub cardiomyopathy: bool,
    pub valvular: bool,
    pub arrhythmia: bool,
}

impl CategoryFlags {
    pub fn get(&self, category: CardiacCategory) -> bool {
        match category {
            CardiacCategory::Ami => self.ami,
            CardiacCategory::HeartFailure => self.heart_failure,
            CardiacCategory::Cardiomyopathy => self.cardiomyopathy,
            CardiacCategory::Valvular => self.valvular,
            CardiacCategory::Arrhythmia => self.arrhythmia,
        }
    }

    pub fn set(&mut self, category: CardiacCategory) {
        match category {
            CardiacCategory::Ami => self.ami = true,
            CardiacCategory::HeartFailure => self.heart_failure = true,
            CardiacCategory::Cardiomyopathy => self.cardiomyopathy = true,
            CardiacCategory::Valvular => self.valvular = true,
            CardiacCategory::Arrhythmia => self.arrhythmia = true,
        }
    }

    pub fn with(mut self, category: CardiacCategory) -> Self {
        self.set(category);
        self
    }

    /// Phép OR, gộp nhiều dòng chẩn đoán thành một lần nhập viện.
    pub fn merge(&mut self, other: CategoryFlags) {
        self.ami |= other.ami;
        self.heart_failure |= other.heart_failure;
        self.cardiomyopathy |= other.cardiomyopathy;
        self.valvular |= other.valvular;
        self.arrhythmia |= other.arrhythmia;
    }

    pub fn any(&self) -> bool {
        CardiacCategory::ALL.iter().any(|category| self.get(*category))
    }
}

/// Nhãn nguyên nhân duy nhất, chọn theo thứ tự ưu tiên nhóm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Etiology {
    #[serde(rename = "AMI-CS")]
    AmiCs,
    #[serde(rename = "HF-CS")]
    HeartFailureCs,
    #[serde(rename = "Cardiomyopathy-CS")]
    CardiomyopathyCs,
    #[serde(rename = "Valvular-CS")]
    ValvularCs,
    #[serde(rename = "Arrhythmia-CS")]
    ArrhythmiaCs,
    #[serde(rename = "No cardiac diagnosis")]
    NoCardiacDiagnosis,
}

impl Etiology {
    pub const ALL: [Etiology; 6] = [
        Etiology::AmiCs,
        Etiology::HeartFailureCs,
        Etiology::CardiomyopathyCs,
        Etiology::ValvularCs,
        Etiology::ArrhythmiaCs,
        Etiology::NoCardiacDiagnosis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Etiology::AmiCs => "AMI-CS",
            Etiology::HeartFailureCs => "HF-CS",
            Etiology::CardiomyopathyCs => "Cardiomyopathy-CS",
            Etiology::ValvularCs => "Valvular-CS",
            Etiology::ArrhythmiaCs => "Arrhythmia-CS",
            Etiology::NoCardiacDiagnosis => "No cardiac diagnosis",
        }
    }

    pub fn category(&self) -> Option<CardiacCategory> {
        match self {
            Etiology::AmiCs => Some(CardiacCategory::Ami),
            Etiology::HeartFailureCs => Some(CardiacCategory::HeartFailure),
            Etiology::CardiomyopathyCs => Some(CardiacCategory::Cardiomyopathy),
            Etiology::ValvularCs => Some(CardiacCategory::Valvular),
            Etiology::ArrhythmiaCs => Some(CardiacCategory::Arrhythmia),
            Etiology::NoCardiacDiagnosis => None,
        }
    }
}

impl fmt::Display for Etiology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tiêu chí sinh lý quan sát được trong cửa sổ đánh giá.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CriteriaFlags {
    pub hypotension: bool,
    pub vasopressor: bool,
    pub lactate: bool,
}

impl CriteriaFlags {
    pub fn count(&self) -> u8 {
        u8::from(self.hypotension) + u8::from(self.vasopressor) + u8::from(self.lactate)
    }
}

/// Cờ cấy máu dương tính ở hai mức thời gian.
///
/// `any_time` chỉ để mô tả; loại trừ dựa trên `within_window`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CultureFlags {
    pub any_time: bool,
    pub within_window: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outcome {
    pub died: bool,
    pub time_to_death_hours: Option<i64>,
    pub survived_24h: bool,
    pub survived_48h: bool,
}

impl Outcome {
    pub fn from_death(intime: NaiveDateTime, death: Option<NaiveDateTime>) -> Self {
        let Some(death) = death else {
            return Self {
                died: false,
                time_to_death_hours: None,
                survived_24h: true,
                survived_48h: true,
            };
        };
        let elapsed = death.signed_duration_since(intime);
        Self {
            died: true,
            time_to_death_hours: Some(floor_hours(elapsed)),
            survived_24h: elapsed > Duration::hours(24),
            survived_48h: elapsed > Duration::hours(48),
        }
    }
}

/// Số giờ nguyên, làm tròn về âm vô cùng.
pub fn floor_hours(duration: Duration) -> i64 {
    duration.num_seconds().div_euclid(3600)
}

/// Toàn bộ thuộc tính suy ra của một lượt điều trị trong đơn vị được chọn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncounterProfile {
    pub encounter: Encounter,
    pub los_hours: i64,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub categories: CategoryFlags,
    pub etiology: Etiology,
    pub criteria: CriteriaFlags,
    pub culture: CultureFlags,
    pub documented: bool,
    pub outcome: Outcome,
}

impl EncounterProfile {
    pub fn has_cardiac_diagnosis(&self) -> bool {
        self.categories.any()
    }

    /// Cấy dương tính trong cửa sổ chỉ loại các lượt không có ghi nhận chẩn đoán.
    pub fn culture_excluded(&self) -> bool {
        self.culture.within_window && !self.documented
    }

    pub fn check_invariants(&self) -> Result<(), CohortError> {
        let fail = |detail: String| {
            Err(CohortError::Invariant {
                stay_id: self.encounter.stay_id,
                detail,
            })
        };
        match self.etiology.category() {
            None if self.categories.any() => {
                fail("no cardiac etiology assigned despite a cardiac category".to_string())
            }
            Some(category) if !self.categories.get(category) => fail(format!(
                "etiology {} assigned without its category flag",
                self.etiology
            )),
            _ if self.criteria.count() > 3 => fail("criteria count exceeds 3".to_string()),
            _ => Ok(()),
        }
    }
}

/// Một dòng của bảng cohort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortRow {
    pub stay_id: StayId,
    pub subject_id: SubjectId,
    pub hadm_id: AdmissionId,
    pub intime: NaiveDateTime,
    pub outtime: NaiveDateTime,
    pub los_hours: i64,
    pub ami: bool,
    pub heart_failure: bool,
    pub cardiomyopathy: bool,
    pub valvular: bool,
    pub arrhythmia: bool,
    pub any_cardiac_diagnosis: bool,
    pub etiology: Etiology,
    pub hypotension_24h: bool,
    pub vasopressor_24h: bool,
    pub lactate_24h: bool,
    pub criteria_count: u8,
    pub positive_culture_any: bool,
    pub positive_culture_24h: bool,
    pub culture_excluded: bool,
    pub documented_diagnosis: bool,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub died: bool,
    pub time_to_death_hours: Option<i64>,
    pub survived_24h: bool,
    pub survived_48h: bool,
}

impl From<&EncounterProfile> for CohortRow {
    fn from(profile: &EncounterProfile) -> Self {
        let encounter = &profile.encounter;
        Self {
            stay_id: encounter.stay_id,
            subject_id: encounter.subject_id,
            hadm_id: encounter.hadm_id,
            intime: encounter.intime,
            outtime: encounter.outtime,
            los_hours: profile.los_hours,
            ami: profile.categories.ami,
            heart_failure: profile.categories.heart_failure,
            cardiomyopathy: profile.categories.cardiomyopathy,
            valvular: profile.categories.valvular,
            arrhythmia: profile.categories.arrhythmia,
            any_cardiac_diagnosis: profile.has_cardiac_diagnosis(),
            etiology: profile.etiology,
            hypotension_24h: profile.criteria.hypotension,
            vasopressor_24h: profile.criteria.vasopressor,
            lactate_24h: profile.criteria.lactate,
            criteria_count: profile.criteria.count(),
            positive_culture_any: profile.culture.any_time,
            positive_culture_24h: profile.culture.within_window,
            culture_excluded: profile.culture_excluded(),
            documented_diagnosis: profile.documented,
            age: profile.age,
            gender: profile.gender.clone(),
            died: profile.outcome.died,
            time_to_death_hours: profile.outcome.time_to_death_hours,
            survived_24h: profile.outcome.survived_24h,
            survived_48h: profile.outcome.survived_48h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2150, 3, day)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    #[test]
    fn criteria_count_is_sum_of_flags() {
        let flags = CriteriaFlags {
            hypotension: true,
            vasopressor: false,
            lactate: true,
        };
        assert_eq!(flags.count(), 2);
        assert_eq!(CriteriaFlags::default().count(), 0);
    }

    #[test]
    fn merged_flags_are_logical_or() {
        let mut flags = CategoryFlags::default().with(CardiacCategory::Ami);
        flags.merge(CategoryFlags::default().with(CardiacCategory::Arrhythmia));
        flags.merge(CategoryFlags::default());
        assert!(flags.ami && flags.arrhythmia);
        assert!(!flags.heart_failure);
        assert!(flags.any());
        assert!(!CategoryFlags::default().any());
    }

    #[test]
    fn survivors_pass_both_landmarks() {
        let outcome = Outcome::from_death(at(1, 8, 0), None);
        assert!(!outcome.died);
        assert!(outcome.survived_24h && outcome.survived_48h);
        assert_eq!(outcome.time_to_death_hours, None);
    }

    #[test]
    fn landmarks_require_death_strictly_after() {
        let exactly_24 = Outcome::from_death(at(1, 8, 0), Some(at(2, 8, 0)));
        assert!(exactly_24.died);
        assert_eq!(exactly_24.time_to_death_hours, Some(24));
        assert!(!exactly_24.survived_24h);

        let later = Outcome::from_death(at(1, 8, 0), Some(at(2, 8, 30)));
        assert_eq!(later.time_to_death_hours, Some(24));
        assert!(later.survived_24h);
        assert!(!later.survived_48h);
    }

    #[test]
    fn death_recorded_before_admission_floors_negative() {
        let outcome = Outcome::from_death(at(1, 8, 0), Some(at(1, 0, 0)));
        assert_eq!(outcome.time_to_death_hours, Some(-8));
        assert!(!outcome.survived_24h);

        assert_eq!(floor_hours(Duration::minutes(-30)), -1);
        assert_eq!(floor_hours(Duration::minutes(90)), 1);
    }

    #[test]
    fn etiology_labels_are_stable() {
        let labels: Vec<_> = Etiology::ALL.iter().map(Etiology::label).collect();
        assert_eq!(
            labels,
            vec![
                "AMI-CS",
                "HF-CS",
                "Cardiomyopathy-CS",
                "Valvular-CS",
                "Arrhythmia-CS",
                "No cardiac diagnosis"
            ]
        );
        assert_eq!(
            serde_json::to_value(Etiology::AmiCs).unwrap(),
            serde_json::json!("AMI-CS")
        );
    }
}
