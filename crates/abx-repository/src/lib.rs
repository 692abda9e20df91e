//! # abx-repository
//!
//! Loads, validates, and indexes the guideline corpus, and answers the
//! pure rule queries (`GetInfectionRegimens`, `GetDrugDose`,
//! `CheckPregnancySafe`, `ClassifyAllergySeverity`, `GetCriticalRules`)
//! that the rest of the pipeline is built on.

pub mod loader;
pub mod queries;
pub mod repository;

pub use repository::GuidelineRepository;
