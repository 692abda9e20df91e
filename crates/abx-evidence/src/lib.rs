//! # abx-evidence
//!
//! The optional tiered evidence coordinator (spec §4.8): a confidence-gated,
//! bounded-concurrency async fan-out over pluggable reputable/broader source
//! backends. The core recommendation pipeline (`abx-rules`, `abx-dosing`,
//! `abx-engine`) is fully functional with this crate entirely absent.

pub mod coordinator;
pub mod source;
pub mod tier;

pub use coordinator::{EvidenceCoordinator, EvidenceOutcome};
pub use source::{EvidenceSource, NullSource, SourceHit};
pub use tier::Tier;
