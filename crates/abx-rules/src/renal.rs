//! 4.4 Renal Adjuster: tiering a drug's dose override by creatinine clearance.
//!
//! The actual override lookup lives in `abx_repository::queries::drug_dose`
//! (spec §4.1: `GetDrugDose` applies renal adjustment inline so the query
//! path stays branch-free at the call site). This module exposes the tiering
//! predicates the selector and the confidence model need without duplicating
//! the lookup itself.

use abx_contracts::corpus::RenalTier;

/// True when `crcl` falls in one of the tiers spec §9's confidence model
/// calls an "edge tier" ([10, 30) mL/min) — close enough to a boundary that
/// renal dosing judgment is least certain.
pub fn is_edge_tier(crcl: f64) -> bool {
    matches!(RenalTier::from_crcl(crcl), RenalTier::Crcl15To29 | RenalTier::Crcl10To14)
}

/// True when `crcl` indicates severe renal impairment (< 30 mL/min),
/// triggering the regimen-level caution in spec §4.6 step 7.
pub fn is_severe_impairment(crcl: f64) -> bool {
    crcl < 30.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_tier_covers_10_to_30() {
        assert!(!is_edge_tier(60.0));
        assert!(!is_edge_tier(30.0));
        assert!(is_edge_tier(29.9));
        assert!(is_edge_tier(10.0));
        assert!(!is_edge_tier(9.9));
    }

    #[test]
    fn severe_impairment_below_30() {
        assert!(is_severe_impairment(29.9));
        assert!(!is_severe_impairment(30.0));
    }
}
