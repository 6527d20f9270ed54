use std::collections::BTreeMap;
use std::fmt;

use cohort_core::{CohortRow, Etiology};
use serde::{Deserialize, Serialize};

/// Descriptive counts over the final cohort.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CohortSummary {
    pub size: usize,
    pub by_etiology: BTreeMap<Etiology, usize>,
    pub documented: usize,
    /// Included through the criteria count alone.
    pub criteria_only: usize,
    pub positive_culture_any: usize,
    pub deaths: usize,
    pub survived_24h: usize,
    pub survived_48h: usize,
}

impl CohortSummary {
    pub fn from_rows(rows: &[CohortRow]) -> Self {
        let count = |pred: fn(&CohortRow) -> bool| rows.iter().filter(|row| pred(row)).count();

        let mut by_etiology = BTreeMap::new();
        for row in rows {
            *by_etiology.entry(row.etiology).or_insert(0) += 1;
        }

        Self {
            size: rows.len(),
            by_etiology,
            documented: count(|row| row.documented_diagnosis),
            criteria_only: count(|row| !row.documented_diagnosis),
            positive_culture_any: count(|row| row.positive_culture_any),
            deaths: count(|row| row.died),
            survived_24h: count(|row| row.survived_24h),
            survived_48h: count(|row| row.survived_48h),
        }
    }
}

impl fmt::Display for CohortSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cohort size: {}", self.size)?;
        for etiology in Etiology::ALL {
            if let Some(n) = self.by_etiology.get(&etiology) {
                writeln!(f, "  {etiology}: {n}")?;
            }
        }
        writeln!(
            f,
            "Documented: {} | Criteria only: {}",
            self.documented, self.criteria_only
        )?;
        writeln!(f, "Positive culture (any time): {}", self.positive_culture_any)?;
        write!(
            f,
            "Deaths: {} | Alive at 24h: {} | Alive at 48h: {}",
            self.deaths, self.survived_24h, self.survived_48h
        )
    }
}
