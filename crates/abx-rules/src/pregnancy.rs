//! 4.3 Pregnancy Filter: given a patient case, return the set of drug ids
//! contraindicated for the patient's trimester.

use std::collections::HashSet;

use abx_repository::GuidelineRepository;

/// The set of drug ids excluded for a pregnant patient.
///
/// Consumers (the selector) filter regimens against this set but never
/// override a contraindication: a regimen that becomes empty after
/// filtering is skipped entirely, never "rescued" by falling back to an
/// unsafe drug.
pub fn excluded_drugs(repository: &GuidelineRepository, trimester: Option<u8>) -> HashSet<String> {
    let Some(trimester) = trimester else {
        return HashSet::new();
    };

    repository
        .all_drug_ids()
        .into_iter()
        .filter(|drug_id| !repository.check_pregnancy_safe(drug_id, Some(trimester)).0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use abx_contracts::collections::OrderedMap;
    use abx_contracts::corpus::{
        ContraindicatedClass, Dosing, DrugDoc, GuidelineCorpus, IndexDoc, Modifiers, PregnancyRules,
    };

    fn repo_with_contraindication() -> GuidelineRepository {
        let mut drugs = OrderedMap::new();
        drugs.insert(
            "doxycycline",
            DrugDoc {
                drug_id: "doxycycline".to_string(),
                drug_name: "Doxycycline".to_string(),
                class: "tetracycline".to_string(),
                spectrum: Default::default(),
                dosing: Dosing { by_indication: OrderedMap::new() },
                monitoring: Default::default(),
                pregnancy_safe: Some("contraindicated".to_string()),
                pregnancy_notes: None,
                renal_adjustment: Default::default(),
            },
        );
        drugs.insert(
            "amoxicillin",
            DrugDoc {
                drug_id: "amoxicillin".to_string(),
                drug_name: "Amoxicillin".to_string(),
                class: "penicillin".to_string(),
                spectrum: Default::default(),
                dosing: Dosing { by_indication: OrderedMap::new() },
                monitoring: Default::default(),
                pregnancy_safe: Some("safe".to_string()),
                pregnancy_notes: None,
                renal_adjustment: Default::default(),
            },
        );

        let mut contraindicated = OrderedMap::new();
        contraindicated.insert(
            "fluoroquinolones",
            ContraindicatedClass { drugs: vec!["ciprofloxacin".to_string()], reason: "cartilage toxicity".to_string(), severity: "contraindicated".to_string() },
        );

        let corpus = GuidelineCorpus {
            version: "test".to_string(),
            index: IndexDoc { version: "test".to_string(), loading_order: vec![], infections: Default::default() },
            infections: OrderedMap::new(),
            drugs,
            modifiers: Modifiers {
                pregnancy_rules: PregnancyRules { contraindicated_antibiotics: contraindicated, trimester_specific_guidance: None },
                ..Default::default()
            },
        };
        abx_repository::repository::test_support::from_corpus(corpus)
    }

    #[test]
    fn no_trimester_excludes_nothing() {
        let repo = repo_with_contraindication();
        assert!(excluded_drugs(&repo, None).is_empty());
    }

    #[test]
    fn excludes_drugs_flagged_contraindicated_in_own_doc() {
        let repo = repo_with_contraindication();
        let excluded = excluded_drugs(&repo, Some(2));
        assert!(excluded.contains("doxycycline"));
        assert!(!excluded.contains("amoxicillin"));
    }
}
