use std::collections::BTreeSet;

use cohort_core::model::normalize_code;
use cohort_core::{AdmissionId, CodeVocabulary, CohortConfig, DiagnosisCode, FreeTextNote};
use tracing::debug;

/// Admissions with explicit documentation of the target diagnosis, either
/// coded or written in a note.
#[derive(Debug, Clone, Default)]
pub struct DocumentationIndex {
    coded: BTreeSet<AdmissionId>,
    noted: BTreeSet<AdmissionId>,
}

impl DocumentationIndex {
    pub fn build(
        diagnoses: &[DiagnosisCode],
        notes: &[FreeTextNote],
        config: &CohortConfig,
    ) -> Self {
        let icd9 = normalize_code(&config.icd9_documentation_code);
        let icd10 = normalize_code(&config.icd10_documentation_code);

        let coded: BTreeSet<AdmissionId> = diagnoses
            .iter()
            .filter(|dx| match dx.vocabulary {
                CodeVocabulary::Icd9 => dx.code == icd9,
                CodeVocabulary::Icd10 => dx.code == icd10,
            })
            .map(|dx| dx.hadm_id)
            .collect();

        let phrase = config.documentation_phrase.to_lowercase();
        let noted: BTreeSet<AdmissionId> = notes
            .iter()
            .filter(|note| mentions(&note.text, &phrase))
            .map(|note| note.hadm_id)
            .collect();

        debug!(
            coded = coded.len(),
            noted = noted.len(),
            "resolved documented admissions"
        );
        Self { coded, noted }
    }

    pub fn is_documented(&self, hadm_id: AdmissionId) -> bool {
        self.coded.contains(&hadm_id) || self.noted.contains(&hadm_id)
    }

    #[cfg(test)]
    fn is_coded(&self, hadm_id: AdmissionId) -> bool {
        self.coded.contains(&hadm_id)
    }

    #[cfg(test)]
    fn is_noted(&self, hadm_id: AdmissionId) -> bool {
        self.noted.contains(&hadm_id)
    }
}

/// `phrase` must already be lower-cased.
fn mentions(text: &str, phrase: &str) -> bool {
    text.to_lowercase().contains(phrase)
}
