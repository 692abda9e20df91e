//! 4.7 Recommendation Engine: `Recommend(case) -> Recommendation`.
//!
//! The single orchestration entry point a hosting application calls. Pure
//! and allocation-only — no I/O happens here, the repository was already
//! loaded by the caller.

use abx_contracts::corpus::GuidelineCorpus;
use abx_contracts::patient::PatientCase;
use abx_contracts::recommendation::{merge_warnings, Recommendation, RecommendationMetadata};
use abx_repository::GuidelineRepository;
use tracing::{debug, warn};

use crate::confidence;
use crate::text;

/// Orchestrates `abx-rules::select_with_signals` then `abx-dosing::calculate_with_signals`
/// over a loaded [`GuidelineRepository`], producing a fully rendered `Recommendation`.
pub struct RecommendationEngine<'a> {
    repository: &'a GuidelineRepository,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(repository: &'a GuidelineRepository) -> Self {
        Self { repository }
    }

    /// `Recommend(case) -> Recommendation`. Never panics and never returns
    /// `Err`: a structural failure (no matching regimen, no dose entry) is
    /// accumulated onto `Recommendation::errors` and `success` is set false,
    /// matching spec §4.7 step 7.
    pub fn recommend(&self, case: &PatientCase) -> Recommendation {
        let corpus = self.repository.current();
        let (selection, selector_signals) = abx_rules::select_with_signals(self.repository, case);

        if !selection.errors.is_empty() || selection.drug_ids.is_empty() {
            warn!(infection_type = %case.infection_type, errors = ?selection.errors, "no regimen selected");
            let mut recommendation = Recommendation {
                success: false,
                infection_category: selection.infection_category,
                allergy_classification: selection.allergy_classification,
                route: selection.route,
                warnings: selection.warnings,
                rationale: selection.rationale,
                errors: selection.errors,
                metadata: metadata(&corpus),
                ..Default::default()
            };
            recommendation.recommendation_text = Some(text::render(&case.infection_type, &recommendation));
            return recommendation;
        }

        let (regimen, dosing_signals) = abx_dosing::calculate_with_signals(
            self.repository,
            &selection.drug_ids,
            selection.infection_category.as_deref().unwrap_or(&case.infection_type),
            case.crcl_ml_min,
            case.weight_kg,
            Some(case.age),
        );

        let success = !regimen.drugs.is_empty();
        if !success {
            warn!(infection_type = %case.infection_type, "dose calculator resolved no drugs");
        }

        let warnings = merge_warnings(selection.warnings, regimen.warnings);
        let confidence = confidence::derive(case, selection.allergy_classification, selector_signals, dosing_signals);
        debug!(confidence, infection_type = %case.infection_type, "recommendation confidence derived");

        let mut recommendation = Recommendation {
            success,
            infection_category: selection.infection_category,
            allergy_classification: selection.allergy_classification,
            route: selection.route,
            drugs: regimen.drugs,
            monitoring: regimen.monitoring,
            warnings,
            rationale: selection.rationale,
            errors: regimen.errors,
            metadata: metadata(&corpus),
            ..Default::default()
        };
        recommendation.recommendation_text = Some(text::render(&case.infection_type, &recommendation));
        recommendation
    }
}

fn metadata(corpus: &GuidelineCorpus) -> RecommendationMetadata {
    RecommendationMetadata { version: corpus.version.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abx_contracts::collections::OrderedMap;
    use abx_contracts::corpus::{
        AllergyStatus, Category, Dosing, DoseEntry, DrugDoc, GuidelineCorpus, IndexDoc, Modifiers,
        Regimen, Route,
    };
    use abx_contracts::patient::PatientCaseBuilder;

    fn uti_corpus() -> GuidelineCorpus {
        let mut by_indication = OrderedMap::new();
        by_indication.insert(
            "cystitis",
            DoseEntry {
                dose: Some("100 mg".to_string()),
                maintenance_dose: None,
                frequency: Some("BID".to_string()),
                route: Some(Route::Po),
                duration: Some("5 days".to_string()),
                loading_dose: None,
                note: None,
                critical_note: None,
            },
        );

        let mut drugs = OrderedMap::new();
        drugs.insert(
            "nitrofurantoin",
            DrugDoc {
                drug_id: "nitrofurantoin".to_string(),
                drug_name: "Nitrofurantoin".to_string(),
                class: "nitrofuran".to_string(),
                spectrum: Default::default(),
                dosing: Dosing { by_indication },
                monitoring: Default::default(),
                pregnancy_safe: Some("safe".to_string()),
                pregnancy_notes: None,
                renal_adjustment: Default::default(),
            },
        );

        let mut infections = OrderedMap::new();
        infections.insert(
            "uti",
            abx_contracts::corpus::InfectionDoc {
                infection_id: "uti".to_string(),
                categories: vec![Category {
                    category: "cystitis".to_string(),
                    route: Some(Route::Po),
                    duration: Some("5 days".to_string()),
                    regimens: vec![Regimen {
                        allergy_status: AllergyStatus::NoAllergy,
                        drugs: vec!["nitrofurantoin".to_string()],
                        route: None,
                        duration: None,
                        reasoning: Some("first-line for uncomplicated cystitis".to_string()),
                        note: None,
                    }],
                }],
            },
        );

        GuidelineCorpus {
            version: "test-1.0".to_string(),
            index: IndexDoc { version: "test-1.0".to_string(), loading_order: vec![], infections: Default::default() },
            infections,
            drugs,
            modifiers: Modifiers::default(),
        }
    }

    #[test]
    fn recommend_produces_success_with_rendered_text() {
        let repo = abx_repository::repository::test_support::from_corpus(uti_corpus());
        let engine = RecommendationEngine::new(&repo);
        let case = PatientCaseBuilder::new(30, "uti").fever(false).build();

        let recommendation = engine.recommend(&case);
        assert!(recommendation.success);
        assert_eq!(recommendation.drugs.len(), 1);
        assert_eq!(recommendation.metadata.version, "test-1.0");
        let text = recommendation.recommendation_text.unwrap();
        assert!(text.contains("Nitrofurantoin"));
    }

    #[test]
    fn recommend_reports_failure_when_no_regimen_matches() {
        let repo = abx_repository::repository::test_support::from_corpus(uti_corpus());
        let engine = RecommendationEngine::new(&repo);
        let case = PatientCaseBuilder::new(30, "osteomyelitis").build();

        let recommendation = engine.recommend(&case);
        assert!(!recommendation.success);
        assert!(!recommendation.errors.is_empty());
        assert!(recommendation.recommendation_text.unwrap().contains("No regimen"));
    }
}
