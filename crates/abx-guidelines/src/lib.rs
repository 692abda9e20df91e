//! The default antibiotic guideline corpus shipped with this workspace.
//!
//! The corpus itself lives on disk under `guidelines/` at the repository
//! root (infections, drugs, and modifier rule files per
//! `abx_contracts::corpus`), loaded through `abx_repository::GuidelineRepository`
//! rather than embedded in the binary, so operators can edit or replace it
//! without a rebuild.

use std::path::PathBuf;

use abx_contracts::corpus::ValidationReport;
use abx_contracts::error::AbxResult;
use abx_repository::GuidelineRepository;

/// Directory containing the default corpus, resolved relative to this
/// crate's manifest so it works regardless of the caller's working directory.
pub fn default_corpus_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../guidelines")
}

/// Load the default corpus, returning the repository and its validation report.
pub fn load_default() -> AbxResult<(GuidelineRepository, ValidationReport)> {
    GuidelineRepository::load(default_corpus_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_corpus_loads_with_no_cross_reference_violations() {
        let (_repo, report) = load_default().expect("default corpus should load");
        assert!(
            report.violations.is_empty(),
            "expected no cross-reference violations, got: {:?}",
            report.violations
        );
    }

    #[test]
    fn default_corpus_resolves_cystitis_no_allergy_to_nitrofurantoin() {
        let (repo, _report) = load_default().expect("default corpus should load");
        let regimens = repo.infection_regimens("uti", Some("cystitis"), abx_contracts::corpus::AllergyStatus::NoAllergy);
        assert!(!regimens.is_empty());
        assert!(regimens[0].drugs.contains(&"nitrofurantoin".to_string()));
    }

    #[test]
    fn default_corpus_resolves_meningitis_regimen_for_both_allergy_paths() {
        let (repo, _report) = load_default().expect("default corpus should load");
        let no_allergy = repo.infection_regimens(
            "meningitis",
            Some("bacterial_meningitis"),
            abx_contracts::corpus::AllergyStatus::NoAllergy,
        );
        assert!(no_allergy[0].drugs.contains(&"ceftriaxone".to_string()));
        assert!(no_allergy[0].drugs.contains(&"vancomycin".to_string()));

        let severe_allergy = repo.infection_regimens(
            "meningitis",
            Some("bacterial_meningitis"),
            abx_contracts::corpus::AllergyStatus::SeverePcnAllergy,
        );
        assert!(severe_allergy[0].drugs.contains(&"aztreonam".to_string()));
    }
}
