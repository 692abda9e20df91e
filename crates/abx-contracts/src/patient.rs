//! The typed patient case the recommendation pipeline is computed over.

use serde::{Deserialize, Serialize};

use crate::error::{AbxError, AbxResult};

/// Severity of presentation, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

/// Care setting, used to distinguish community vs. hospital-acquired infection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Community,
    Ward,
    Ed,
    Hospital,
    Icu,
    Ventilator,
}

/// A structured, validated patient case. Immutable once constructed; the
/// pipeline never mutates it and discards it after producing a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientCase {
    pub age: u32,
    pub infection_type: String,
    #[serde(default)]
    pub allergies: String,
    /// Trimester in {1, 2, 3}; absent means not pregnant or unknown.
    pub pregnancy: Option<u8>,
    pub weight_kg: Option<f64>,
    pub crcl_ml_min: Option<f64>,
    pub fever: Option<bool>,
    pub severity: Option<Severity>,
    pub location: Option<Location>,
    pub presentation: Option<String>,
    pub mrsa_risk: Option<bool>,
    pub prior_resistance: Option<String>,
    pub culture_results: Option<String>,
    pub current_antibiotics: Option<String>,
}

impl PatientCase {
    pub fn builder(age: u32, infection_type: impl Into<String>) -> PatientCaseBuilder {
        PatientCaseBuilder::new(age, infection_type)
    }
}

/// Ergonomic construction for tests and scenario fixtures.
#[derive(Debug, Clone)]
pub struct PatientCaseBuilder {
    case: PatientCase,
}

impl PatientCaseBuilder {
    pub fn new(age: u32, infection_type: impl Into<String>) -> Self {
        Self {
            case: PatientCase {
                age,
                infection_type: infection_type.into(),
                allergies: String::new(),
                pregnancy: None,
                weight_kg: None,
                crcl_ml_min: None,
                fever: None,
                severity: None,
                location: None,
                presentation: None,
                mrsa_risk: None,
                prior_resistance: None,
                culture_results: None,
                current_antibiotics: None,
            },
        }
    }

    pub fn allergies(mut self, text: impl Into<String>) -> Self {
        self.case.allergies = text.into();
        self
    }

    pub fn pregnancy(mut self, trimester: u8) -> Self {
        self.case.pregnancy = Some(trimester);
        self
    }

    pub fn weight_kg(mut self, kg: f64) -> Self {
        self.case.weight_kg = Some(kg);
        self
    }

    pub fn crcl_ml_min(mut self, crcl: f64) -> Self {
        self.case.crcl_ml_min = Some(crcl);
        self
    }

    pub fn fever(mut self, fever: bool) -> Self {
        self.case.fever = Some(fever);
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.case.severity = Some(severity);
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.case.location = Some(location);
        self
    }

    pub fn presentation(mut self, text: impl Into<String>) -> Self {
        self.case.presentation = Some(text.into());
        self
    }

    pub fn mrsa_risk(mut self, risk: bool) -> Self {
        self.case.mrsa_risk = Some(risk);
        self
    }

    pub fn build(self) -> PatientCase {
        self.case
    }
}

/// A loosely-typed case as it arrives from an external ingress adapter
/// (the HTTP layer, a form, a message queue) before projection onto the
/// typed `PatientCase`. Every field is an owned, optional string so the
/// adapter can hand over whatever it parsed without reaching into private
/// pipeline state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPatientCase {
    pub age: Option<String>,
    pub infection_type: Option<String>,
    pub allergies: Option<String>,
    /// Free-text pregnancy indicator: "2", "2nd trimester", "second", etc.
    pub pregnancy: Option<String>,
    pub weight_kg: Option<String>,
    /// `crcl` and `gfr` are treated as synonyms; `crcl` wins if both are set.
    pub crcl: Option<String>,
    pub gfr: Option<String>,
    pub fever: Option<String>,
    pub severity: Option<String>,
    pub location: Option<String>,
    pub presentation: Option<String>,
    pub mrsa_risk: Option<String>,
    pub prior_resistance: Option<String>,
    pub culture_results: Option<String>,
    pub current_antibiotics: Option<String>,
}

impl TryFrom<RawPatientCase> for PatientCase {
    type Error = AbxError;

    fn try_from(raw: RawPatientCase) -> AbxResult<Self> {
        let age: u32 = raw
            .age
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| AbxError::InvalidInput { reason: "age is required and must be a non-negative integer".to_string() })?;

        let infection_type = raw
            .infection_type
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AbxError::InvalidInput { reason: "infection_type is required".to_string() })?;

        let pregnancy = raw.pregnancy.as_deref().and_then(parse_trimester);

        let weight_kg = raw.weight_kg.as_deref().and_then(|s| s.trim().parse().ok());
        let crcl_ml_min = raw
            .crcl
            .as_deref()
            .or(raw.gfr.as_deref())
            .and_then(|s| s.trim().parse().ok());

        let fever = raw.fever.as_deref().and_then(parse_bool);
        let mrsa_risk = raw.mrsa_risk.as_deref().and_then(parse_bool);

        let severity = raw.severity.as_deref().and_then(|s| match s.to_lowercase().as_str() {
            "mild" => Some(Severity::Mild),
            "moderate" => Some(Severity::Moderate),
            "severe" => Some(Severity::Severe),
            _ => None,
        });

        let location = raw.location.as_deref().and_then(|s| {
            let lower = s.to_lowercase();
            if lower.contains("icu") {
                Some(Location::Icu)
            } else if lower.contains("ventilator") || lower.contains("vap") {
                Some(Location::Ventilator)
            } else if lower.contains("hospital") || lower.contains("hap") {
                Some(Location::Hospital)
            } else if lower.contains("ed") {
                Some(Location::Ed)
            } else if lower.contains("ward") {
                Some(Location::Ward)
            } else if lower.contains("community") {
                Some(Location::Community)
            } else {
                None
            }
        });

        Ok(PatientCase {
            age,
            infection_type,
            allergies: raw.allergies.unwrap_or_default(),
            pregnancy,
            weight_kg,
            crcl_ml_min,
            fever,
            severity,
            location,
            presentation: raw.presentation,
            mrsa_risk,
            prior_resistance: raw.prior_resistance,
            culture_results: raw.culture_results,
            current_antibiotics: raw.current_antibiotics,
        })
    }
}

/// Parse a free-text pregnancy/trimester indicator into 1, 2, or 3.
fn parse_trimester(text: &str) -> Option<u8> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() || lower == "false" || lower == "none" || lower == "0" {
        return None;
    }
    if lower.contains("first") || lower.contains('1') {
        Some(1)
    } else if lower.contains("second") || lower.contains('2') {
        Some(2)
    } else if lower.contains("third") || lower.contains('3') {
        Some(3)
    } else {
        None
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_case_requires_age_and_infection_type() {
        let raw = RawPatientCase::default();
        let err = PatientCase::try_from(raw).unwrap_err();
        assert!(matches!(err, AbxError::InvalidInput { .. }));
    }

    #[test]
    fn raw_case_parses_trimester_strings() {
        assert_eq!(parse_trimester("2nd trimester"), Some(2));
        assert_eq!(parse_trimester("third"), Some(3));
        assert_eq!(parse_trimester("1st"), Some(1));
        assert_eq!(parse_trimester(""), None);
    }

    #[test]
    fn raw_case_falls_back_to_gfr_when_crcl_absent() {
        let raw = RawPatientCase {
            age: Some("60".to_string()),
            infection_type: Some("uti".to_string()),
            gfr: Some("45".to_string()),
            ..Default::default()
        };
        let case = PatientCase::try_from(raw).unwrap();
        assert_eq!(case.crcl_ml_min, Some(45.0));
    }
}
