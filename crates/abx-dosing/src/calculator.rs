//! 4.6 Dose Calculator: `Calculate(drug_ids, indication, crcl?, weight?, age?) -> Regimen`.

use abx_contracts::error::AbxError;
use abx_contracts::recommendation::{DosedDrug, Regimen};
use abx_repository::GuidelineRepository;
use tracing::warn;

use crate::indication::candidates;
use crate::weight;

/// Structural signals a caller (the confidence model in `abx-engine`) needs
/// but that don't belong in the stable `Regimen` response shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct DosingSignals {
    /// At least one drug's dose entry was resolved via the insertion-order
    /// substring scan rather than a direct indication-key hit.
    pub used_substring_fallback: bool,
}

/// Calculate the priced, warned, monitored regimen for a selected drug list.
///
/// Never fails outright: a drug whose dose cannot be resolved is skipped
/// with an error appended to `Regimen::errors`, and calculation continues
/// with the remaining drugs (spec §4.6 step 8).
pub fn calculate(
    repository: &GuidelineRepository,
    drug_ids: &[String],
    indication: &str,
    crcl: Option<f64>,
    weight_kg: Option<f64>,
    age: Option<u32>,
) -> Regimen {
    calculate_with_signals(repository, drug_ids, indication, crcl, weight_kg, age).0
}

/// Same as [`calculate`], additionally returning the structural signals the
/// confidence model consumes.
pub fn calculate_with_signals(
    repository: &GuidelineRepository,
    drug_ids: &[String],
    indication: &str,
    crcl: Option<f64>,
    weight_kg: Option<f64>,
    age: Option<u32>,
) -> (Regimen, DosingSignals) {
    let mut regimen = Regimen::default();
    let mut signals = DosingSignals::default();

    for drug_id in drug_ids {
        match dose_one(repository, drug_id, indication, crcl, weight_kg) {
            Ok((dosed, used_substring_fallback)) => {
                signals.used_substring_fallback |= used_substring_fallback;
                for item in &dosed.warnings {
                    regimen.warnings.push(item.clone());
                }
                regimen.drugs.push(dosed);
            }
            Err(err) => {
                warn!(drug_id = %drug_id, indication = %indication, error = %err, "no dose entry found for drug/indication");
                regimen.errors.push(err.to_string());
            }
        }
    }

    // Monitoring is deduplicated at the regimen level across all drugs.
    for dosed in &regimen.drugs {
        if let Some(drug) = repository.drug(&dosed.drug_id) {
            for item in &drug.monitoring.required {
                if !regimen.monitoring.contains(item) {
                    regimen.monitoring.push(item.clone());
                }
            }
        }
    }

    if let Some(crcl) = crcl {
        if crcl < 30.0 {
            regimen.warnings.push("Severe renal impairment - consult pharmacist for complex dosing".to_string());
        }
    }
    if let Some(age) = age {
        if age >= 65 {
            regimen.warnings.push("Elderly patient - monitor for adverse effects".to_string());
        }
    }

    (regimen, signals)
}

fn dose_one(
    repository: &GuidelineRepository,
    drug_id: &str,
    indication: &str,
    crcl: Option<f64>,
    weight_kg: Option<f64>,
) -> Result<(DosedDrug, bool), AbxError> {
    // Try each indication candidate (spec §4.6 step 3's substring-fallback
    // chain); the repository fails closed on each miss, so only the last
    // candidate's error is worth surfacing when every candidate misses.
    let mut last_err = None;
    let resolved = candidates(indication).into_iter().find_map(|candidate| match repository.drug_dose(drug_id, &candidate, crcl) {
        Ok(resolved) => Some(resolved),
        Err(err) => {
            last_err = Some(err);
            None
        }
    });
    let resolved = resolved.ok_or_else(|| {
        last_err.unwrap_or_else(|| AbxError::MissingDoseEntry { drug_id: drug_id.to_string(), indication: indication.to_string() })
    })?;
    let used_substring_fallback = resolved.used_substring_fallback;

    let drug = repository.drug(drug_id);

    let mut notes = Vec::new();
    let mut warnings = Vec::new();

    if let Some(loading) = &resolved.entry.loading_dose {
        notes.push(format!("Loading dose: {loading}"));
    }
    if let Some(note) = &resolved.entry.note {
        notes.push(note.clone());
    }
    if let Some(critical) = &resolved.entry.critical_note {
        warnings.push(critical.clone());
    }

    if resolved.renal_adjusted {
        if let Some(crcl) = crcl {
            warnings.push(format!("Dose adjusted for CrCl = {crcl} mL/min"));
        }
        if let Some(renal_note) = &resolved.renal_note {
            notes.push(renal_note.clone());
        }
    }

    if let Some(drug) = &drug {
        if drug.renal_adjustment.critical {
            warnings.push(format!("{} is nephrotoxic - monitor renal function", capitalize(drug_id)));
        }
    }

    let calculated_dose = if weight::requires_weight_based_dosing(drug_id) {
        match weight_kg {
            Some(kg) => {
                notes.push(format!("Calculated for {kg} kg patient"));
                // Weight-based dosing always derives from the guideline's
                // nominal mg/kg range, not a renal-tier override string —
                // the override changes interval/monitoring, not the per-kg
                // target (spec §8.6 scenario 4).
                let mut entry_for_weight = resolved.entry.clone();
                if resolved.renal_adjusted {
                    entry_for_weight.maintenance_dose = resolved.original_dose.clone();
                    entry_for_weight.dose = None;
                    // `resolved.entry.frequency` was cleared to avoid double-
                    // printing the already-adjusted dose string; the renal
                    // tier's own interval comes back through this field.
                    entry_for_weight.frequency = resolved.renal_adjusted_frequency.clone();
                }
                weight::calculate(&entry_for_weight, kg)
            }
            None => {
                warnings.push("weight required for accurate dosing".to_string());
                None
            }
        }
    } else {
        None
    };

    let coverage = drug.as_ref().map(coverage_from_spectrum).unwrap_or_default();

    Ok((
        DosedDrug {
            drug_id: resolved.drug_id.clone(),
            drug_name: resolved.drug_name.clone(),
            class: resolved.class.clone(),
            dose: resolved.entry.effective_dose().map(str::to_string),
            frequency: resolved.entry.frequency.clone(),
            route: resolved.entry.route,
            duration: resolved.entry.duration.clone(),
            loading_dose: resolved.entry.loading_dose.clone(),
            notes,
            warnings,
            coverage,
            renal_adjusted: resolved.renal_adjusted,
            original_dose: resolved.original_dose.clone(),
            calculated_dose,
        },
        used_substring_fallback,
    ))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Coverage summary for the rationale section: only spectrum grades marked
/// "excellent" are surfaced, matching `original_source/lib/dose_calculator.py`.
fn coverage_from_spectrum(drug: &abx_contracts::corpus::DrugDoc) -> Vec<String> {
    let mut coverage = Vec::new();
    let spectrum = &drug.spectrum;
    if grade_is_excellent(&spectrum.gram_positive) {
        coverage.push("gram-positive".to_string());
    }
    if grade_is_excellent(&spectrum.gram_negative) {
        coverage.push("gram-negative".to_string());
    }
    if grade_is_excellent(&spectrum.anaerobes) {
        coverage.push("anaerobes".to_string());
    }
    if grade_is_excellent(&spectrum.atypicals) {
        coverage.push("atypicals".to_string());
    }
    coverage
}

fn grade_is_excellent(grade: &Option<String>) -> bool {
    grade.as_deref().map(|g| g.to_lowercase().contains("excellent")).unwrap_or(false)
}
