//! Cohort derivation: unit filter, documentation, diagnosis classification,
//! windowed criteria, culture exclusion and final assembly.

pub mod admission;
pub mod assembler;
pub mod attrition;
pub mod criteria;
pub mod diagnosis;
pub mod documentation;
pub mod exclusion;
pub mod summary;

pub use assembler::{derive_cohort, profile_encounters, CohortRun};
pub use attrition::{AttritionReport, AttritionStep};
pub use summary::CohortSummary;

#[cfg(test)]
pub(crate) mod testing;
