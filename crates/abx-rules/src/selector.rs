//! 4.5 Drug Selector: `Select(case) -> Selection`.

use abx_contracts::corpus::Route;
use abx_contracts::patient::{Location, PatientCase, Severity};
use abx_contracts::recommendation::Selection;
use abx_repository::GuidelineRepository;

use crate::allergy::classify_allergy;
use crate::pregnancy::excluded_drugs;

/// Map a patient case onto an infection subcategory and its default route,
/// per spec §4.5 step 1. Infection types outside the recognized set pass
/// through unchanged with route IV ("general" fallback).
fn derive_subcategory_and_route(case: &PatientCase) -> (String, Route) {
    let infection_type = case.infection_type.to_lowercase();
    let presentation = case.presentation.as_deref().unwrap_or("").to_lowercase();

    match infection_type.as_str() {
        "uti" => {
            let pyelonephritis = case.fever == Some(true)
                || ["flank", "costovertebral", "cvat"].iter().any(|t| presentation.contains(t));
            if pyelonephritis {
                ("pyelonephritis".to_string(), Route::Iv)
            } else {
                ("cystitis".to_string(), Route::Po)
            }
        }
        "pneumonia" => {
            let severe = case.location == Some(Location::Icu) || case.severity == Some(Severity::Severe);
            if severe {
                ("severe_cap".to_string(), Route::Iv)
            } else if case.location == Some(Location::Hospital) {
                ("hap".to_string(), Route::Iv)
            } else if case.location == Some(Location::Ventilator) {
                ("vap".to_string(), Route::Iv)
            } else if presentation.contains("aspiration") {
                ("aspiration".to_string(), Route::Iv)
            } else {
                ("cap".to_string(), Route::Iv)
            }
        }
        "intra_abdominal" => {
            if case.severity == Some(Severity::Severe) {
                ("severe_intra_abdominal".to_string(), Route::Iv)
            } else {
                ("moderate_intra_abdominal".to_string(), Route::Iv)
            }
        }
        "bacteremia" | "sepsis" => {
            let mrsa = case.mrsa_risk == Some(true) || presentation.contains("mrsa");
            if mrsa {
                ("bacteremia_mrsa".to_string(), Route::Iv)
            } else {
                ("bacteremia".to_string(), Route::Iv)
            }
        }
        "meningitis" => ("bacterial_meningitis".to_string(), Route::Iv),
        other => (other.to_string(), Route::Iv),
    }
}

/// Structural signals a caller (the confidence model in `abx-engine`) needs
/// but that don't belong in the stable `Selection` response shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorSignals {
    /// The subcategory-qualified lookup came back empty and the selector
    /// retried against the whole infection (spec §4.5 step 4).
    pub fell_back_without_subcategory: bool,
    /// The winning regimen lost at least one drug to pregnancy exclusion.
    pub pregnancy_drug_removed: bool,
}

/// `Select(case) -> Selection`. Never panics or returns `Err`: structural
/// failures (no matching infection, no surviving regimen) are accumulated
/// onto `Selection::errors` and a partially populated `Selection` is
/// returned regardless, per spec §4.5 step 7.
pub fn select(repository: &GuidelineRepository, case: &PatientCase) -> Selection {
    select_with_signals(repository, case).0
}

/// Same as [`select`], additionally returning the structural signals the
/// confidence model consumes.
pub fn select_with_signals(repository: &GuidelineRepository, case: &PatientCase) -> (Selection, SelectorSignals) {
    let mut signals = SelectorSignals::default();
    let (subcategory, default_route) = derive_subcategory_and_route(case);
    let allergy_classification = classify_allergy(repository, &case.allergies);
    let allergy_status = allergy_classification.as_allergy_status();
    let pregnancy_excluded = excluded_drugs(repository, case.pregnancy);
    let infection_type = case.infection_type.to_lowercase();

    let mut selection = Selection {
        infection_category: Some(subcategory.clone()),
        route: Some(default_route),
        allergy_classification,
        ..Default::default()
    };

    let mut regimens = repository.infection_regimens(&infection_type, Some(&subcategory), allergy_status);
    if regimens.is_empty() {
        regimens = repository.infection_regimens(&infection_type, None, allergy_status);
        signals.fell_back_without_subcategory = true;
    }
    if regimens.is_empty() {
        selection.errors.push(format!(
            "no regimen found for infection '{infection_type}' category '{subcategory}' allergy status '{allergy_status}'"
        ));
        return (selection, signals);
    }

    // First regimen (source order) with at least one drug surviving
    // pregnancy exclusion wins. A regimen emptied by exclusion is skipped,
    // never rescued by substituting an unsafe drug.
    let chosen = regimens.into_iter().find_map(|regimen| {
        let surviving: Vec<String> =
            regimen.drugs.iter().filter(|d| !pregnancy_excluded.contains(d.as_str())).cloned().collect();
        if surviving.is_empty() {
            None
        } else {
            let removed = surviving.len() < regimen.drugs.len();
            Some((regimen, surviving, removed))
        }
    });

    let Some((regimen, surviving_drugs, pregnancy_drug_removed)) = chosen else {
        selection.errors.push(format!(
            "no regimen survives allergy/pregnancy filtering for infection '{infection_type}' category '{subcategory}'"
        ));
        return (selection, signals);
    };
    signals.pregnancy_drug_removed = pregnancy_drug_removed;

    selection.infection_category = Some(regimen.category.clone());
    selection.route = regimen.route.or(Some(default_route));
    selection.drug_ids = surviving_drugs;
    if let Some(reasoning) = regimen.reasoning {
        selection.rationale.push(reasoning);
    }
    if let Some(note) = regimen.note {
        selection.warnings.push(note);
    }

    for rule in repository.critical_rules(&infection_type) {
        if !selection.warnings.contains(&rule) {
            selection.warnings.push(rule);
        }
    }

    if selection.route == Some(Route::Iv) {
        let already_warned = selection
            .warnings
            .iter()
            .any(|w| w.to_lowercase().contains("iv") && w.to_lowercase().contains("requir"));
        if !already_warned {
            selection.warnings.push("IV therapy is required for this indication".to_string());
        }
    }

    (selection, signals)
}
