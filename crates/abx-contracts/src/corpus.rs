//! The guideline corpus data model: infection protocols, drug monographs,
//! and cross-cutting modifier documents loaded from disk.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::collections::OrderedMap;

/// The full, versioned guideline corpus. Process-wide, read-mostly; queries
/// against it are pure functions of its contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineCorpus {
    pub version: String,
    pub index: IndexDoc,
    pub infections: OrderedMap<InfectionDoc>,
    pub drugs: OrderedMap<DrugDoc>,
    pub modifiers: Modifiers,
}

/// `index.json`: global metadata, loading order, per-infection critical rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDoc {
    pub version: String,
    pub loading_order: Vec<String>,
    #[serde(default)]
    pub infections: HashMap<String, InfectionIndexEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfectionIndexEntry {
    #[serde(default)]
    pub critical_rules: Vec<String>,
}

/// `infections/<id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfectionDoc {
    pub infection_id: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub category: String,
    pub route: Option<Route>,
    pub duration: Option<String>,
    pub regimens: Vec<Regimen>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Route {
    Iv,
    Po,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Iv => write!(f, "IV"),
            Route::Po => write!(f, "PO"),
        }
    }
}

/// Allergy classification a regimen is qualified for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergyStatus {
    NoAllergy,
    MildPcnAllergy,
    SeverePcnAllergy,
}

impl std::fmt::Display for AllergyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllergyStatus::NoAllergy => write!(f, "no_allergy"),
            AllergyStatus::MildPcnAllergy => write!(f, "mild_pcn_allergy"),
            AllergyStatus::SeverePcnAllergy => write!(f, "severe_pcn_allergy"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regimen {
    pub allergy_status: AllergyStatus,
    pub drugs: Vec<String>,
    pub route: Option<Route>,
    pub duration: Option<String>,
    pub reasoning: Option<String>,
    pub note: Option<String>,
}

/// `drugs/<id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugDoc {
    pub drug_id: String,
    pub drug_name: String,
    pub class: String,
    #[serde(default)]
    pub spectrum: Spectrum,
    pub dosing: Dosing,
    #[serde(default)]
    pub monitoring: Monitoring,
    pub pregnancy_safe: Option<String>,
    pub pregnancy_notes: Option<String>,
    #[serde(default)]
    pub renal_adjustment: RenalAdjustmentFlag,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spectrum {
    pub gram_positive: Option<String>,
    pub gram_negative: Option<String>,
    pub anaerobes: Option<String>,
    pub atypicals: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dosing {
    pub by_indication: OrderedMap<DoseEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseEntry {
    pub dose: Option<String>,
    pub maintenance_dose: Option<String>,
    pub frequency: Option<String>,
    pub route: Option<Route>,
    pub duration: Option<String>,
    pub loading_dose: Option<String>,
    pub note: Option<String>,
    pub critical_note: Option<String>,
}

impl DoseEntry {
    /// The teacher's `dose_value = dose_info.get('dose') or dose_info.get('maintenance_dose')`.
    pub fn effective_dose(&self) -> Option<&str> {
        self.dose.as_deref().or(self.maintenance_dose.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Monitoring {
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenalAdjustmentFlag {
    #[serde(default)]
    pub critical: bool,
}

/// The three cross-cutting modifier documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub allergy_rules: AllergyRules,
    #[serde(default)]
    pub pregnancy_rules: PregnancyRules,
    #[serde(default)]
    pub renal_adjustment_rules: RenalAdjustmentRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllergyRules {
    #[serde(default)]
    pub allergy_classification: AllergyClassificationRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllergyClassificationRules {
    #[serde(default)]
    pub mild: KeywordList,
    #[serde(default)]
    pub severe: KeywordList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordList {
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PregnancyRules {
    #[serde(default)]
    pub contraindicated_antibiotics: OrderedMap<ContraindicatedClass>,
    pub trimester_specific_guidance: Option<TrimesterGuidance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContraindicatedClass {
    #[serde(default)]
    pub drugs: Vec<String>,
    pub reason: String,
    #[serde(default = "default_severity")]
    pub severity: String,
}

fn default_severity() -> String {
    "contraindicated".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrimesterGuidance {
    pub first_trimester: Option<TrimesterAvoidList>,
    pub second_third_trimester: Option<TrimesterAvoidList>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrimesterAvoidList {
    #[serde(default)]
    pub avoid: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenalAdjustmentRules {
    #[serde(default)]
    pub drugs_requiring_adjustment: OrderedMap<RenalAdjustmentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenalAdjustmentEntry {
    #[serde(default)]
    pub adjustment_required: bool,
    pub crcl_30_60: Option<String>,
    pub crcl_15_29: Option<String>,
    pub crcl_10_29: Option<String>,
    pub crcl_lt_15: Option<String>,
    pub crcl_lt_10: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub monitoring: Vec<String>,
}

impl RenalAdjustmentEntry {
    /// Pick the adjusted dose string for a CrCl tier, per `_get_renal_adjustment`.
    ///
    /// `crcl_lt_15` is tried before `crcl_lt_10` when both are absent from a
    /// document — matching the loader's `or` fallback.
    pub fn dose_for_tier(&self, tier: RenalTier) -> Option<&str> {
        match tier {
            RenalTier::None => None,
            RenalTier::Crcl30To60 => self.crcl_30_60.as_deref(),
            RenalTier::Crcl15To29 => self.crcl_15_29.as_deref(),
            RenalTier::Crcl10To14 => self.crcl_10_29.as_deref(),
            RenalTier::CrclUnder10 => self.crcl_lt_15.as_deref().or(self.crcl_lt_10.as_deref()),
        }
    }
}

/// The CrCl tier a patient falls into, per spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenalTier {
    /// crcl >= 60: no adjustment needed.
    None,
    /// [30, 60)
    Crcl30To60,
    /// [15, 30)
    Crcl15To29,
    /// [10, 15)
    Crcl10To14,
    /// [0, 10)
    CrclUnder10,
}

impl RenalTier {
    pub fn from_crcl(crcl: f64) -> Self {
        if crcl >= 60.0 {
            RenalTier::None
        } else if crcl >= 30.0 {
            RenalTier::Crcl30To60
        } else if crcl >= 15.0 {
            RenalTier::Crcl15To29
        } else if crcl >= 10.0 {
            RenalTier::Crcl10To14
        } else {
            RenalTier::CrclUnder10
        }
    }
}

/// A cross-reference violation found while validating a loaded corpus:
/// an infection regimen names a drug id absent from `drugs`. Returned as
/// data from `Load`, never a thrown failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossReferenceViolation {
    pub infection_id: String,
    pub category: String,
    pub drug_id: String,
}

impl std::fmt::Display for CrossReferenceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "infection '{}' category '{}' references unknown drug '{}'",
            self.infection_id, self.category, self.drug_id
        )
    }
}

/// Returned alongside a successfully loaded corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<CrossReferenceViolation>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}
