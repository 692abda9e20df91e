//! Weight-based (mg/kg) dose computation, gated to the small set of drugs
//! that require it — currently glycopeptides (vancomycin).
//!
//! Grounded in `original_source/lib/dose_calculator.py::_calculate_vancomycin_dose`,
//! generalized from that function's hardcoded `"15-20 mg/kg"` / `"25-30 mg/kg"`
//! substring checks into a general range parser, per spec §4.6 step 4.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use abx_contracts::corpus::DoseEntry;
use abx_contracts::recommendation::CalculatedDose;

/// Drugs whose dose is additionally computed from patient weight. Currently
/// just glycopeptides; any future expansion stays behind this same gate
/// (spec §9 design note).
pub static WEIGHT_BASED_DRUGS: Lazy<HashSet<&'static str>> = Lazy::new(|| HashSet::from(["vancomycin"]));

pub fn requires_weight_based_dosing(drug_id: &str) -> bool {
    WEIGHT_BASED_DRUGS.contains(drug_id)
}

/// Parse the leading "X-Y mg/kg" (or "X mg/kg") numeric token immediately
/// preceding an `"mg/kg"` marker and return its midpoint (or itself, if not
/// a range).
pub fn parse_mg_per_kg_midpoint(text: &str) -> Option<f64> {
    let marker = text.to_lowercase().find("mg/kg")?;
    let before = &text[..marker];
    let token = before
        .trim_end()
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| c == '(' || c == ')');

    if let Some(sep_idx) = token.find(['-', '\u{2013}', '\u{2014}']) {
        let (low, rest) = token.split_at(sep_idx);
        let sep_len = rest.chars().next()?.len_utf8();
        let high = &rest[sep_len..];
        let low: f64 = low.trim().parse().ok()?;
        let high: f64 = high.trim().parse().ok()?;
        Some((low + high) / 2.0)
    } else {
        token.trim().parse().ok()
    }
}

/// Round a milligram amount to the nearest 250 mg, per spec §4.6 step 4.
pub fn round_to_nearest_250(mg: f64) -> u32 {
    (((mg / 250.0).round()) * 250.0) as u32
}

/// Compute a weight-based loading/maintenance dose from a `DoseEntry`.
/// Returns `None` when `weight_kg` is absent; callers attach the
/// "weight required for accurate dosing" warning in that case.
pub fn calculate(entry: &DoseEntry, weight_kg: f64) -> Option<CalculatedDose> {
    let mut calculated = CalculatedDose::default();

    if let Some(loading_str) = &entry.loading_dose {
        if let Some(mid) = parse_mg_per_kg_midpoint(loading_str) {
            let mg = round_to_nearest_250(mid * weight_kg);
            calculated.loading_dose_calculated = Some(format!("{mg} mg IV once"));
        }
    }

    let maintenance_str = entry.maintenance_dose.as_deref().or(entry.dose.as_deref()).unwrap_or("");
    if let Some(mid) = parse_mg_per_kg_midpoint(maintenance_str) {
        let mg = round_to_nearest_250(mid * weight_kg);
        let frequency = entry.frequency.as_deref().unwrap_or("q8-12h");
        calculated.maintenance_dose_calculated = Some(format!("{mg} mg IV {frequency}"));
    }

    if calculated.loading_dose_calculated.is_some() || calculated.maintenance_dose_calculated.is_some() {
        Some(calculated)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hyphenated_range_midpoint() {
        assert_eq!(parse_mg_per_kg_midpoint("15-20 mg/kg IV"), Some(17.5));
        assert_eq!(parse_mg_per_kg_midpoint("25-30 mg/kg IV once"), Some(27.5));
    }

    #[test]
    fn parses_single_value_without_range() {
        assert_eq!(parse_mg_per_kg_midpoint("10 mg/kg IV"), Some(10.0));
    }

    #[test]
    fn rounds_to_nearest_250_mg() {
        assert_eq!(round_to_nearest_250(17.5 * 80.0), 1500);
        assert_eq!(round_to_nearest_250(27.5 * 70.0), 2000);
    }

    #[test]
    fn vancomycin_17_5_mg_per_kg_times_80kg_rounds_to_1500() {
        let entry = DoseEntry {
            dose: None,
            maintenance_dose: Some("15-20 mg/kg IV".to_string()),
            frequency: Some("q12h".to_string()),
            route: None,
            duration: None,
            loading_dose: None,
            note: None,
            critical_note: None,
        };
        let calc = calculate(&entry, 80.0).unwrap();
        assert_eq!(calc.maintenance_dose_calculated.as_deref(), Some("1500 mg IV q12h"));
    }
}
