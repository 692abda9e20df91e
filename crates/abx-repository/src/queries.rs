//! Pure query methods over a loaded `GuidelineCorpus`.
//!
//! Every function here is a pure function of the corpus's contents —
//! the concurrency model (§5) depends on the query path never touching a
//! lock or mutating anything.

use abx_contracts::corpus::{AllergyStatus, Category, DoseEntry, DrugDoc, GuidelineCorpus, RenalTier, Route};
use abx_contracts::error::{AbxError, AbxResult};

/// A regimen enriched with its parent category's name and effective
/// route/duration, as returned by `GetInfectionRegimens`.
#[derive(Debug, Clone)]
pub struct ResolvedRegimen {
    pub category: String,
    pub allergy_status: AllergyStatus,
    pub drugs: Vec<String>,
    pub route: Option<Route>,
    pub duration: Option<String>,
    pub reasoning: Option<String>,
    pub note: Option<String>,
}

/// `GetInfectionRegimens(infection_id, subcategory?, allergy_status)`.
///
/// Filters by `subcategory` as a case-insensitive substring match on the
/// category name when provided. Preserves source order.
pub fn infection_regimens(
    corpus: &GuidelineCorpus,
    infection_id: &str,
    subcategory: Option<&str>,
    allergy_status: AllergyStatus,
) -> Vec<ResolvedRegimen> {
    let Some(infection) = corpus.infections.get(infection_id) else {
        return Vec::new();
    };

    let categories: Vec<&Category> = infection
        .categories
        .iter()
        .filter(|c| match subcategory {
            Some(sub) => c.category.to_lowercase().contains(&sub.to_lowercase()),
            None => true,
        })
        .collect();

    let mut matching = Vec::new();
    for category in categories {
        for regimen in &category.regimens {
            if regimen.allergy_status == allergy_status {
                matching.push(ResolvedRegimen {
                    category: category.category.clone(),
                    allergy_status: regimen.allergy_status,
                    drugs: regimen.drugs.clone(),
                    route: regimen.route.or(category.route),
                    duration: regimen.duration.clone().or_else(|| category.duration.clone()),
                    reasoning: regimen.reasoning.clone(),
                    note: regimen.note.clone(),
                });
            }
        }
    }
    matching
}

/// A dose entry enriched with drug metadata and renal-adjustment flags, as
/// returned by `GetDrugDose`.
#[derive(Debug, Clone)]
pub struct ResolvedDose {
    pub drug_id: String,
    pub drug_name: String,
    pub class: String,
    pub entry: DoseEntry,
    pub renal_adjusted: bool,
    pub original_dose: Option<String>,
    /// The renal tier's own frequency token, for weight-based calculation
    /// (which needs it as a bare interval, not baked into `entry.dose`).
    pub renal_adjusted_frequency: Option<String>,
    pub renal_note: Option<String>,
    pub extra_monitoring: Vec<String>,
    /// True when `indication` missed a direct key and was resolved via the
    /// insertion-order substring scan (spec §4.1/§9 "substring-fallback
    /// indication lookup").
    pub used_substring_fallback: bool,
}

/// `GetDrugDose(drug_id, indication, crcl?)`.
///
/// Looks up `by_indication[indication]` directly; on miss, falls back to the
/// first key containing `indication` as a substring (insertion order).
/// Applies renal adjustment when `crcl` is given. Fails with `NotFound`-style
/// errors (`UnknownDrug`, `MissingDoseEntry`) rather than collapsing "drug
/// unknown" and "indication unresolved" into a bare `None` — callers that
/// need to distinguish those cases, or just report the reason, get it from
/// the `AbxError` itself (spec §4.1).
pub fn drug_dose(corpus: &GuidelineCorpus, drug_id: &str, indication: &str, crcl: Option<f64>) -> AbxResult<ResolvedDose> {
    let drug = corpus.drugs.get(drug_id).ok_or_else(|| AbxError::UnknownDrug { drug_id: drug_id.to_string() })?;

    let missing_dose_entry = || AbxError::MissingDoseEntry { drug_id: drug_id.to_string(), indication: indication.to_string() };

    let direct_hit = drug.dosing.by_indication.contains_key(indication);
    let resolved_key = if direct_hit {
        indication.to_string()
    } else {
        drug.dosing.by_indication.find_key_containing(indication).ok_or_else(missing_dose_entry)?.to_string()
    };

    let mut entry = drug.dosing.by_indication.get(&resolved_key).ok_or_else(missing_dose_entry)?.clone();

    let mut renal_adjusted = false;
    let mut original_dose = None;
    let mut renal_adjusted_frequency = None;
    let mut renal_note = None;
    let mut extra_monitoring = Vec::new();

    if let Some(crcl) = crcl {
        if let Some(adjustment) = renal_adjustment(corpus, drug_id, crcl) {
            renal_adjusted = true;
            original_dose = entry.effective_dose().map(str::to_string);
            // The renal tier string already bakes in route and frequency
            // (e.g. "2.25 g IV q8h"); clear the now-stale pre-adjustment
            // fields so the renderer doesn't append them a second time.
            entry.dose = Some(adjustment.adjusted_dose_string.clone());
            entry.maintenance_dose = None;
            entry.frequency = None;
            entry.route = None;
            renal_adjusted_frequency = adjustment.adjusted_frequency.clone();
            renal_note = Some(adjustment.renal_note);
            extra_monitoring = adjustment.monitoring;
        }
    }

    Ok(ResolvedDose {
        drug_id: drug_id.to_string(),
        drug_name: drug.drug_name.clone(),
        class: drug.class.clone(),
        entry,
        renal_adjusted,
        original_dose,
        renal_adjusted_frequency,
        renal_note,
        extra_monitoring,
        used_substring_fallback: !direct_hit,
    })
}

pub struct RenalAdjustment {
    pub adjusted_dose_string: String,
    /// The frequency token (e.g. `"q48h"`) embedded in `adjusted_dose_string`,
    /// extracted so weight-based dosing can use the renally-adjusted
    /// interval instead of the pre-adjustment `DoseEntry::frequency`.
    pub adjusted_frequency: Option<String>,
    pub renal_note: String,
    pub monitoring: Vec<String>,
}

/// Pull the `"q<digits>h"` interval token out of a renal-tier dose string
/// such as `"15 mg/kg IV q48h"`. Tiers with no fixed interval (e.g.
/// `"redose per trough"`) yield `None`.
fn extract_frequency_token(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|tok| tok.trim_matches(|c: char| c == ',' || c == '.'))
        .find(|tok| {
            let lower = tok.to_lowercase();
            lower.len() > 2 && lower.starts_with('q') && lower.ends_with('h') && lower[1..lower.len() - 1].chars().all(|c| c.is_ascii_digit())
        })
        .map(str::to_string)
}

/// `4.4 Renal Adjuster`: given a drug id and CrCl, return a dose override
/// or `None` when no adjustment applies.
pub fn renal_adjustment(corpus: &GuidelineCorpus, drug_id: &str, crcl: f64) -> Option<RenalAdjustment> {
    let entry = corpus.modifiers.renal_adjustment_rules.drugs_requiring_adjustment.get(drug_id)?;
    if !entry.adjustment_required {
        return None;
    }

    let tier = RenalTier::from_crcl(crcl);
    if tier == RenalTier::None {
        return None;
    }

    let adjusted = entry.dose_for_tier(tier)?;

    Some(RenalAdjustment {
        adjusted_dose_string: adjusted.to_string(),
        adjusted_frequency: extract_frequency_token(adjusted),
        renal_note: entry.note.clone().unwrap_or_else(|| "Dose adjusted for renal impairment".to_string()),
        monitoring: entry.monitoring.clone(),
    })
}

/// `CheckPregnancySafe(drug_id, trimester?) -> (safe, reason?)`.
pub fn check_pregnancy_safe(corpus: &GuidelineCorpus, drug_id: &str, trimester: Option<u8>) -> (bool, Option<String>) {
    for (_class_label, class_data) in corpus.modifiers.pregnancy_rules.contraindicated_antibiotics.iter() {
        if class_data.drugs.iter().any(|d| d == drug_id) {
            let reason = format!("{}: {}", class_data.severity.to_uppercase(), class_data.reason);
            return (false, Some(reason));
        }
    }

    if let Some(trimester) = trimester {
        if let Some(guidance) = &corpus.modifiers.pregnancy_rules.trimester_specific_guidance {
            let tier = if trimester == 1 { &guidance.first_trimester } else { &guidance.second_third_trimester };
            if let Some(tier) = tier {
                if tier.avoid.iter().any(|d| d == drug_id) {
                    return (false, Some(format!("Avoid in trimester {}", trimester)));
                }
            }
        }
    }

    if let Some(drug) = corpus.drugs.get(drug_id) {
        if let Some(pregnancy_safe) = &drug.pregnancy_safe {
            if pregnancy_safe == "contraindicated" {
                return (false, Some(drug.pregnancy_notes.clone().unwrap_or_else(|| "Contraindicated".to_string())));
            }
            if pregnancy_safe.to_lowercase().contains("avoid") {
                return (false, Some(drug.pregnancy_notes.clone().unwrap_or_else(|| "Use with caution".to_string())));
            }
        }
    }

    (true, None)
}

/// `ClassifyAllergySeverity(text) -> {mild, severe, unknown}`.
///
/// Severe keywords are checked before mild ones: a description that
/// mentions both ("rash progressing to anaphylaxis") is severe.
pub fn classify_allergy_severity(corpus: &GuidelineCorpus, text: &str) -> &'static str {
    if text.trim().is_empty() {
        return "unknown";
    }
    let lower = text.to_lowercase();
    let classification = &corpus.modifiers.allergy_rules.allergy_classification;

    if classification.severe.keywords.iter().any(|k| lower.contains(&k.to_lowercase())) {
        return "severe";
    }
    if classification.mild.keywords.iter().any(|k| lower.contains(&k.to_lowercase())) {
        return "mild";
    }
    "unknown"
}

/// `GetCriticalRules(infection_id)`.
pub fn critical_rules(corpus: &GuidelineCorpus, infection_id: &str) -> Vec<String> {
    corpus
        .index
        .infections
        .get(infection_id)
        .map(|entry| entry.critical_rules.clone())
        .unwrap_or_default()
}

pub fn all_drug_ids(corpus: &GuidelineCorpus) -> Vec<&str> {
    corpus.drugs.keys().collect()
}

pub fn drug<'a>(corpus: &'a GuidelineCorpus, drug_id: &str) -> Option<&'a DrugDoc> {
    corpus.drugs.get(drug_id)
}
