//! # abx-contracts
//!
//! Shared types for the antibiotic recommendation pipeline: the patient
//! case, the guideline corpus data model, and the selection/dosing/
//! recommendation output types.
//!
//! All other crates in the workspace import from here. No business logic
//! lives in this crate — only data definitions and error types.

pub mod collections;
pub mod corpus;
pub mod error;
pub mod patient;
pub mod recommendation;

#[cfg(test)]
mod tests {
    use crate::corpus::{RenalAdjustmentEntry, RenalTier};
    use crate::error::AbxError;
    use crate::recommendation::AllergyClassification;

    #[test]
    fn renal_tier_boundaries_match_spec() {
        assert!(matches!(RenalTier::from_crcl(90.0), RenalTier::None));
        assert!(matches!(RenalTier::from_crcl(60.0), RenalTier::None));
        assert!(matches!(RenalTier::from_crcl(59.9), RenalTier::Crcl30To60));
        assert!(matches!(RenalTier::from_crcl(30.0), RenalTier::Crcl30To60));
        assert!(matches!(RenalTier::from_crcl(29.9), RenalTier::Crcl15To29));
        assert!(matches!(RenalTier::from_crcl(15.0), RenalTier::Crcl15To29));
        assert!(matches!(RenalTier::from_crcl(14.9), RenalTier::Crcl10To14));
        assert!(matches!(RenalTier::from_crcl(10.0), RenalTier::Crcl10To14));
        assert!(matches!(RenalTier::from_crcl(9.9), RenalTier::CrclUnder10));
    }

    #[test]
    fn renal_adjustment_entry_prefers_crcl_lt_15_over_crcl_lt_10() {
        let entry = RenalAdjustmentEntry {
            adjustment_required: true,
            crcl_30_60: None,
            crcl_15_29: None,
            crcl_10_29: None,
            crcl_lt_15: Some("500 mg q24h".to_string()),
            crcl_lt_10: Some("500 mg q48h".to_string()),
            note: None,
            monitoring: vec![],
        };
        assert_eq!(entry.dose_for_tier(RenalTier::CrclUnder10), Some("500 mg q24h"));
    }

    #[test]
    fn allergy_classification_display_matches_stable_response_keys() {
        assert_eq!(AllergyClassification::NoAllergy.to_string(), "no_allergy");
        assert_eq!(AllergyClassification::SeverePcnAllergy.to_string(), "severe_pcn_allergy");
    }

    #[test]
    fn error_display_messages_carry_context() {
        let err = AbxError::UnknownDrug { drug_id: "amoxiclav".to_string() };
        assert!(err.to_string().contains("amoxiclav"));
    }
}
