//! Thực thể nguồn đúng như khi đọc từ dữ liệu trích xuất.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{AdmissionId, StayId, SubjectId};

/// Một lượt nằm đơn vị điều trị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Encounter {
    pub stay_id: StayId,
    pub subject_id: SubjectId,
    pub hadm_id: AdmissionId,
    pub care_unit: String,
    pub intime: NaiveDateTime,
    pub outtime: NaiveDateTime,
}

/// Hai bộ mã chẩn đoán cùng tồn tại trong dữ liệu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CodeVocabulary {
    Icd9,
    Icd10,
}

impl CodeVocabulary {
    /// Xác định bộ mã từ cột phiên bản nếu có, nếu không thì dựa vào dạng mã:
    /// mã ICD-9 bắt đầu bằng chữ số.
    pub fn resolve(version: Option<u8>, code: &str) -> Self {
        match version {
            Some(9) => CodeVocabulary::Icd9,
            Some(10) => CodeVocabulary::Icd10,
            _ => Self::infer(code),
        }
    }

    pub fn infer(code: &str) -> Self {
        match code.trim().chars().next() {
            Some(c) if c.is_ascii_digit() => CodeVocabulary::Icd9,
            _ => CodeVocabulary::Icd10,
        }
    }
}

/// Một chẩn đoán đã mã hóa gắn với một lần nhập viện.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosisCode {
    pub hadm_id: AdmissionId,
    /// Mã đã chuẩn hóa: bỏ khoảng trắng, viết hoa, bỏ dấu chấm.
    pub code: String,
    pub vocabulary: CodeVocabulary,
}

impl DiagnosisCode {
    pub fn new(hadm_id: AdmissionId, raw_code: &str, version: Option<u8>) -> Self {
        let code = normalize_code(raw_code);
        let vocabulary = CodeVocabulary::resolve(version, &code);
        Self {
            hadm_id,
            code,
            vocabulary,
        }
    }
}

pub fn normalize_code(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Liên kết một phép đo với lượt nằm đơn vị, lần nhập viện hoặc cả hai.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordOwner {
    pub stay_id: Option<StayId>,
    pub hadm_id: Option<AdmissionId>,
}

impl RecordOwner {
    /// Dòng gắn lượt nằm chỉ khớp với lượt đó. Dòng không gắn khớp với mọi
    /// lượt của lần nhập viện.
    pub fn belongs_to(&self, encounter: &Encounter) -> bool {
        match (self.stay_id, self.hadm_id) {
            (Some(stay_id), _) => stay_id == encounter.stay_id,
            (None, Some(hadm_id)) => hadm_id == encounter.hadm_id,
            (None, None) => false,
        }
    }
}

/// Chỉ số sống, kết quả xét nghiệm hoặc bản ghi dùng thuốc.
///
/// Với dòng thuốc, `recorded_at` là giờ bắt đầu, `ended_at` là giờ kết thúc
/// và `value` là tốc độ truyền.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub owner: RecordOwner,
    pub concept_id: i64,
    pub recorded_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MicrobiologyResult {
    pub subject_id: SubjectId,
    pub hadm_id: Option<AdmissionId>,
    pub charted_at: Option<NaiveDateTime>,
    pub specimen: String,
    pub organism: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreeTextNote {
    pub hadm_id: AdmissionId,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Demographics {
    pub subject_id: SubjectId,
    pub gender: Option<String>,
    pub anchor_age: i32,
    pub anchor_year: i32,
    pub dod: Option<NaiveDateTime>,
}

impl Demographics {
    pub fn age_at(&self, at: NaiveDateTime) -> i32 {
        use chrono::Datelike;
        self.anchor_age + (at.year() - self.anchor_year)
    }
}

/// Toàn bộ bảng nguồn pipeline đọc, giữ bất biến trong một lần chạy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceSnapshot {
    pub encounters: Vec<Encounter>,
    pub diagnoses: Vec<DiagnosisCode>,
    pub vitals: Vec<Measurement>,
    pub labs: Vec<Measurement>,
    pub medications: Vec<Measurement>,
    pub microbiology: Vec<MicrobiologyResult>,
    pub notes: Vec<FreeTextNote>,
    pub demographics: Vec<Demographics>,
}
