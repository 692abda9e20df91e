//! Output types produced by the drug selector, dose calculator, and the
//! recommendation engine that orchestrates them.

use serde::{Deserialize, Serialize};

use crate::corpus::{AllergyStatus, Route};

/// The drug selector's output: `Select(case) -> Selection`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selection {
    pub infection_category: Option<String>,
    pub route: Option<Route>,
    pub allergy_classification: AllergyClassification,
    pub drug_ids: Vec<String>,
    pub rationale: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// `allergy_classification` in the stable response shape. `Other` covers a
/// non-PCN allergy, which the selector treats like `NoAllergy` for regimen
/// matching but still reports distinctly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergyClassification {
    #[default]
    NoAllergy,
    MildPcnAllergy,
    SeverePcnAllergy,
    Other,
}

impl AllergyClassification {
    /// Map onto the corpus's `AllergyStatus` for regimen matching. `Other`
    /// and `NoAllergy` both match `no_allergy` regimens.
    pub fn as_allergy_status(self) -> AllergyStatus {
        match self {
            AllergyClassification::NoAllergy | AllergyClassification::Other => AllergyStatus::NoAllergy,
            AllergyClassification::MildPcnAllergy => AllergyStatus::MildPcnAllergy,
            AllergyClassification::SeverePcnAllergy => AllergyStatus::SeverePcnAllergy,
        }
    }
}

impl std::fmt::Display for AllergyClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllergyClassification::NoAllergy => write!(f, "no_allergy"),
            AllergyClassification::MildPcnAllergy => write!(f, "mild_pcn_allergy"),
            AllergyClassification::SeverePcnAllergy => write!(f, "severe_pcn_allergy"),
            AllergyClassification::Other => write!(f, "other"),
        }
    }
}

/// A fully priced drug order, one per selected drug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DosedDrug {
    pub drug_id: String,
    pub drug_name: String,
    pub class: String,
    pub dose: Option<String>,
    pub frequency: Option<String>,
    pub route: Option<Route>,
    pub duration: Option<String>,
    pub loading_dose: Option<String>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub coverage: Vec<String>,
    pub renal_adjusted: bool,
    pub original_dose: Option<String>,
    pub calculated_dose: Option<CalculatedDose>,
}

/// Weight-based dosing computed for drugs like vancomycin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculatedDose {
    pub loading_dose_calculated: Option<String>,
    pub maintenance_dose_calculated: Option<String>,
}

/// The dose calculator's output: `Calculate(...) -> Regimen`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Regimen {
    pub drugs: Vec<DosedDrug>,
    pub monitoring: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// The final recommendation engine output: `Recommend(case) -> Result`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendation {
    pub success: bool,
    pub recommendation_text: Option<String>,
    pub drugs: Vec<DosedDrug>,
    pub infection_category: Option<String>,
    pub allergy_classification: AllergyClassification,
    pub route: Option<Route>,
    pub warnings: Vec<String>,
    pub monitoring: Vec<String>,
    pub rationale: Vec<String>,
    pub errors: Vec<String>,
    pub metadata: RecommendationMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationMetadata {
    pub version: String,
}

/// Merge two warning lists, deduplicating while preserving first-occurrence
/// order — used when the engine combines selector and calculator warnings.
pub fn merge_warnings(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut merged = Vec::with_capacity(first.len() + second.len());
    for warning in first.into_iter().chain(second) {
        if !merged.contains(&warning) {
            merged.push(warning);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_warnings_dedupes_preserving_first_occurrence() {
        let merged = merge_warnings(
            vec!["a".to_string(), "b".to_string()],
            vec!["b".to_string(), "c".to_string()],
        );
        assert_eq!(merged, vec!["a", "b", "c"]);
    }
}
