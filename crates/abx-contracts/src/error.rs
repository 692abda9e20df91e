//! Error types for the antibiotic recommendation pipeline.
//!
//! Most pipeline failures are not `Err` — a missing regimen or an unknown
//! drug id is accumulated onto the `Recommendation` itself so a caller still
//! gets a partial, explainable result. `AbxError` is reserved for conditions
//! that make it impossible to produce any result at all: a corpus that won't
//! parse, a structurally invalid patient case, a poisoned lock.

use thiserror::Error;

/// The unified error type for the antibiotic recommendation pipeline.
#[derive(Debug, Error)]
pub enum AbxError {
    /// The guideline corpus on disk is missing a required file or failed to parse.
    #[error("invalid guideline corpus at {path}: {reason}")]
    InvalidCorpus { path: String, reason: String },

    /// The requested infection type has no entry in the loaded corpus.
    #[error("unknown infection type: {infection_type}")]
    UnknownInfection { infection_type: String },

    /// No regimen in the matched infection category survived allergy,
    /// pregnancy, and renal filtering.
    #[error("no regimen available for {infection_type}/{category}: {reason}")]
    NoRegimen {
        infection_type: String,
        category: String,
        reason: String,
    },

    /// A regimen referenced a drug id absent from the corpus's drug map.
    #[error("unknown drug id: {drug_id}")]
    UnknownDrug { drug_id: String },

    /// A drug document has no dose entry matching the patient's indication
    /// or weight/renal tier.
    #[error("no dose entry for drug '{drug_id}' under indication '{indication}'")]
    MissingDoseEntry { drug_id: String, indication: String },

    /// The patient case supplied to the pipeline is structurally invalid
    /// (missing age, missing infection type, unparseable trimester, etc).
    #[error("invalid patient case: {reason}")]
    InvalidInput { reason: String },

    /// An evidence coordinator search tier failed or exhausted its budget.
    #[error("external evidence search failed: {reason}")]
    ExternalSearchFailure { reason: String },

    /// The caller cancelled an in-flight evidence search.
    #[error("evidence search cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the pipeline crates.
pub type AbxResult<T> = Result<T, AbxError>;
