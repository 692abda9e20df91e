//! 4.2 Allergy Classifier: free-text allergy description -> severity class.

use abx_contracts::recommendation::AllergyClassification;
use abx_repository::GuidelineRepository;

const PCN_TOKENS: [&str; 3] = ["penicillin", "pcn", "pen "];

/// Classify a free-text allergy description into the selector's
/// `{no_allergy, mild_pcn_allergy, severe_pcn_allergy, other}` partition.
///
/// PCN-ness is checked first (a non-PCN allergy is reported as `other` and
/// is treated like `no_allergy` by the selector); then the repository's
/// keyword-based severity classification decides mild vs. severe, defaulting
/// to mild when the description mentions PCN but severity is unclear.
pub fn classify_allergy(repository: &GuidelineRepository, allergy_description: &str) -> AllergyClassification {
    if allergy_description.trim().is_empty() {
        return AllergyClassification::NoAllergy;
    }

    let lower = allergy_description.to_lowercase();
    if !PCN_TOKENS.iter().any(|token| lower.contains(token)) {
        return AllergyClassification::Other;
    }

    match repository.classify_allergy_severity(allergy_description) {
        "severe" => AllergyClassification::SeverePcnAllergy,
        "mild" => AllergyClassification::MildPcnAllergy,
        // Unclear PCN mention defaults to mild: biased toward treating
        // infection over withholding therapy (spec design note).
        _ => AllergyClassification::MildPcnAllergy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abx_contracts::corpus::{AllergyClassificationRules, AllergyRules, GuidelineCorpus, IndexDoc, KeywordList, Modifiers};
    use abx_contracts::collections::OrderedMap;

    fn repo_with_keywords() -> GuidelineRepository {
        let corpus = GuidelineCorpus {
            version: "test".to_string(),
            index: IndexDoc { version: "test".to_string(), loading_order: vec![], infections: Default::default() },
            infections: OrderedMap::new(),
            drugs: OrderedMap::new(),
            modifiers: Modifiers {
                allergy_rules: AllergyRules {
                    allergy_classification: AllergyClassificationRules {
                        mild: KeywordList { keywords: vec!["rash".to_string(), "hives".to_string()] },
                        severe: KeywordList { keywords: vec!["anaphylaxis".to_string(), "sjs".to_string()] },
                    },
                },
                ..Default::default()
            },
        };
        abx_repository::repository::test_support::from_corpus(corpus)
    }

    #[test]
    fn no_allergy_for_empty_text() {
        let repo = repo_with_keywords();
        assert_eq!(classify_allergy(&repo, ""), AllergyClassification::NoAllergy);
        assert_eq!(classify_allergy(&repo, "   "), AllergyClassification::NoAllergy);
    }

    #[test]
    fn non_pcn_allergy_is_other() {
        let repo = repo_with_keywords();
        assert_eq!(classify_allergy(&repo, "Sulfa (rash)"), AllergyClassification::Other);
    }

    #[test]
    fn severe_keyword_wins_over_mild() {
        let repo = repo_with_keywords();
        assert_eq!(
            classify_allergy(&repo, "Penicillin - anaphylaxis"),
            AllergyClassification::SeverePcnAllergy
        );
    }

    #[test]
    fn mild_keyword_classifies_mild() {
        let repo = repo_with_keywords();
        assert_eq!(classify_allergy(&repo, "Penicillin (rash)"), AllergyClassification::MildPcnAllergy);
    }

    #[test]
    fn ambiguous_pcn_mention_defaults_to_mild() {
        let repo = repo_with_keywords();
        assert_eq!(classify_allergy(&repo, "PCN allergy, details unknown"), AllergyClassification::MildPcnAllergy);
    }
}
