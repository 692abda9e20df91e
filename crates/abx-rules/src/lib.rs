//! # abx-rules
//!
//! The patient-facing clinical rules: the allergy classifier (§4.2), the
//! pregnancy filter (§4.3), the renal-tier predicates (§4.4), and the drug
//! selector (§4.5) that combines all three to map a `PatientCase` onto a
//! `Selection`.

pub mod allergy;
pub mod pregnancy;
pub mod renal;
pub mod selector;

pub use selector::{select, select_with_signals, SelectorSignals};
