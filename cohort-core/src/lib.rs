//! Mô hình dữ liệu lõi cho pipeline dựng cohort sốc tim.
//!
//! Các bảng nguồn là ảnh chụp chỉ đọc của dữ liệu ICU. Mọi thứ engine suy ra
//! nằm trong [`derived`] và được tính lại ở mỗi lần chạy.

pub mod config;
pub mod derived;
pub mod model;
pub mod window;

pub use config::{CohortConfig, VasopressorAgent, MAX_WINDOW_HOURS};
pub use derived::{
    CardiacCategory, CategoryFlags, CohortRow, CriteriaFlags, CultureFlags, EncounterProfile,
    Etiology, Outcome,
};
pub use model::{
    CodeVocabulary, Demographics, DiagnosisCode, Encounter, FreeTextNote, Measurement,
    MicrobiologyResult, RecordOwner, SourceSnapshot,
};
pub use window::TimeWindow;

pub type SubjectId = i64;
pub type AdmissionId = i64;
pub type StayId = i64;

/// Lỗi khi nạp dữ liệu nguồn hoặc dựng cohort.
///
/// Thiếu dòng dữ liệu không phải là lỗi; khi đó kết quả là trường hợp âm tính.
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    #[error("source relation not found: {0}")]
    MissingRelation(String),
    #[error("could not parse source data: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("derived flags inconsistent for stay {stay_id}: {detail}")]
    Invariant { stay_id: StayId, detail: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CohortError> = std::result::Result<T, E>;
