use serde::{Deserialize, Serialize};

use crate::CohortError;

/// Giới hạn trên của cửa sổ đánh giá: một năm.
pub const MAX_WINDOW_HOURS: u32 = 24 * 366;

/// Một thuốc trong nhóm vận mạch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VasopressorAgent {
    pub name: String,
    pub concept_id: i64,
    /// Tốc độ phải vượt quá (ngặt). `None` nghĩa là chỉ cần có dùng thuốc.
    #[serde(default)]
    pub min_rate: Option<f64>,
}

impl VasopressorAgent {
    fn presence(name: &str, concept_id: i64) -> Self {
        Self {
            name: name.to_string(),
            concept_id,
            min_rate: None,
        }
    }

    pub fn accepts(&self, rate: Option<f64>) -> bool {
        match self.min_rate {
            None => true,
            Some(threshold) => rate.map_or(false, |rate| rate > threshold),
        }
    }
}

/// Cấu hình ngưỡng, mã khái niệm và danh sách mã điều khiển pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortConfig {
    /// Giá trị `first_careunit` chính xác của đơn vị được chọn.
    pub care_unit: String,
    /// Độ dài (giờ) của cửa sổ đánh giá mở khi nhập đơn vị.
    pub window_hours: u32,
    pub icd9_documentation_code: String,
    pub icd10_documentation_code: String,
    /// So khớp không phân biệt hoa thường ở bất kỳ đâu trong ghi chú.
    pub documentation_phrase: String,
    pub hypotension_concepts: Vec<i64>,
    /// Huyết áp tâm thu phải nằm trong `(0, hypotension_below)`.
    pub hypotension_below: f64,
    pub lactate_concepts: Vec<i64>,
    pub lactate_at_least: f64,
    pub vasopressors: Vec<VasopressorAgent>,
    /// Chuỗi con (không phân biệt hoa thường) của mô tả bệnh phẩm.
    pub culture_specimen: String,
    /// Tên vi sinh vật không được tính là cấy dương tính.
    pub unspecified_organism: String,
    pub min_age: i32,
    pub min_los_hours: i64,
    pub min_criteria: u8,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            care_unit: "Coronary Care Unit (CCU)".to_string(),
            window_hours: 24,
            icd9_documentation_code: "78551".to_string(),
            icd10_documentation_code: "R570".to_string(),
            documentation_phrase: "cardiogenic shock".to_string(),
            hypotension_concepts: vec![220050, 220179],
            hypotension_below: 90.0,
            lactate_concepts: vec![50813],
            lactate_at_least: 2.0,
            vasopressors: vec![
                VasopressorAgent::presence("norepinephrine", 221906),
                VasopressorAgent::presence("epinephrine", 221289),
                VasopressorAgent::presence("vasopressin", 222315),
                VasopressorAgent::presence("phenylephrine", 221749),
                VasopressorAgent {
                    name: "dopamine".to_string(),
                    concept_id: 221662,
                    min_rate: Some(5.0),
                },
            ],
            culture_specimen: "BLOOD".to_string(),
            unspecified_organism: "UNSPECIFIED".to_string(),
            min_age: 18,
            min_los_hours: 8,
            min_criteria: 2,
        }
    }
}

impl CohortConfig {
    pub fn validate(&self) -> Result<(), CohortError> {
        let invalid = |msg: &str| Err(CohortError::InvalidConfig(msg.to_string()));

        if self.care_unit.trim().is_empty() {
            return invalid("care_unit must not be empty");
        }
        if self.window_hours == 0 {
            return invalid("window_hours must be positive");
        }
        if self.window_hours > MAX_WINDOW_HOURS {
            return invalid("window_hours must not exceed one year");
        }
        if self.documentation_phrase.trim().is_empty() {
            return invalid("documentation_phrase must not be empty");
        }
        if self.hypotension_concepts.is_empty() || self.lactate_concepts.is_empty() {
            return invalid("hypotension and lactate concept lists must not be empty");
        }
        if self.vasopressors.is_empty() {
            return invalid("at least one vasopressor agent is required");
        }
        if !self.hypotension_below.is_finite() || !self.lactate_at_least.is_finite() {
            return invalid("thresholds must be finite numbers");
        }
        if let Some(agent) = self
            .vasopressors
            .iter()
            .find(|agent| agent.min_rate.map_or(false, |rate| !rate.is_finite()))
        {
            return Err(CohortError::InvalidConfig(format!(
                "vasopressor {} has a non-finite rate threshold",
                agent.name
            )));
        }
        if self.culture_specimen.trim().is_empty() {
            return invalid("culture_specimen must not be empty");
        }
        if self.min_criteria > 3 {
            return invalid("min_criteria cannot exceed the three available criteria");
        }
        Ok(())
    }

    pub fn vasopressor(&self, concept_id: i64) -> Option<&VasopressorAgent> {
        self.vasopressors
            .iter()
            .find(|agent| agent.concept_id == concept_id)
    }
}
