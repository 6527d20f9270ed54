use std::collections::BTreeMap;

use cohort_core::{
    AdmissionId, CardiacCategory, CategoryFlags, CodeVocabulary, DiagnosisCode, Etiology,
};
use tracing::debug;

/// Code prefixes defining one cardiac category in both vocabularies.
pub struct CategoryRule {
    pub category: CardiacCategory,
    pub icd9: &'static [&'static str],
    pub icd10: &'static [&'static str],
}

impl CategoryRule {
    fn matches(&self, dx: &DiagnosisCode) -> bool {
        let prefixes = match dx.vocabulary {
            CodeVocabulary::Icd9 => self.icd9,
            CodeVocabulary::Icd10 => self.icd10,
        };
        prefixes.iter().any(|prefix| dx.code.starts_with(prefix))
    }
}

pub const CATEGORY_RULES: [CategoryRule; 5] = [
    CategoryRule {
        category: CardiacCategory::Ami,
        icd9: &["410"],
        icd10: &["I21", "I22"],
    },
    CategoryRule {
        category: CardiacCategory::HeartFailure,
        icd9: &["428"],
        icd10: &["I50"],
    },
    CategoryRule {
        category: CardiacCategory::Cardiomyopathy,
        icd9: &["425"],
        icd10: &["I42", "I43"],
    },
    CategoryRule {
        category: CardiacCategory::Valvular,
        icd9: &["394", "395", "396", "424"],
        icd10: &["I05", "I06", "I08", "I34", "I35"],
    },
    CategoryRule {
        category: CardiacCategory::Arrhythmia,
        icd9: &["427"],
        icd10: &["I47", "I48", "I49"],
    },
];

/// Etiology rules in priority order. The first matching rule labels the encounter.
pub const ETIOLOGY_RULES: [(fn(&CategoryFlags) -> bool, Etiology); 5] = [
    (|flags: &CategoryFlags| flags.ami, Etiology::AmiCs),
    (|flags: &CategoryFlags| flags.heart_failure, Etiology::HeartFailureCs),
    (|flags: &CategoryFlags| flags.cardiomyopathy, Etiology::CardiomyopathyCs),
    (|flags: &CategoryFlags| flags.valvular, Etiology::ValvularCs),
    (|flags: &CategoryFlags| flags.arrhythmia, Etiology::ArrhythmiaCs),
];

/// Category flags raised by a single diagnosis row.
pub fn classify_code(dx: &DiagnosisCode) -> CategoryFlags {
    CATEGORY_RULES
        .iter()
        .filter(|rule| rule.matches(dx))
        .fold(CategoryFlags::default(), |flags, rule| flags.with(rule.category))
}

pub fn assign_etiology(flags: &CategoryFlags) -> Etiology {
    ETIOLOGY_RULES
        .iter()
        .find(|(applies, _)| applies(flags))
        .map_or(Etiology::NoCardiacDiagnosis, |(_, etiology)| *etiology)
}

/// Category flags per admission, OR-ed across all of its diagnosis rows.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisIndex {
    by_admission: BTreeMap<AdmissionId, CategoryFlags>,
}

impl DiagnosisIndex {
    pub fn build(diagnoses: &[DiagnosisCode]) -> Self {
        let mut by_admission: BTreeMap<AdmissionId, CategoryFlags> = BTreeMap::new();
        for dx in diagnoses {
            let flags = classify_code(dx);
            if flags.any() {
                by_admission.entry(dx.hadm_id).or_default().merge(flags);
            }
        }
        debug!(
            admissions = by_admission.len(),
            "classified cardiac diagnoses"
        );
        Self { by_admission }
    }

    pub fn flags_for(&self, hadm_id: AdmissionId) -> CategoryFlags {
        self.by_admission
            .get(&hadm_id)
            .copied()
            .unwrap_or_default()
    }
}
