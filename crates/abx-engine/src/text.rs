//! Deterministic plain-text rendering of a `Recommendation`.
//!
//! Grounded in `original_source/lib/recommendation_engine.py::_format_recommendation`
//! for section order and content, rendered without that source's emoji and
//! product-branding footer.

use abx_contracts::recommendation::{DosedDrug, Recommendation};

pub fn render(case_infection_type: &str, recommendation: &Recommendation) -> String {
    let mut out = String::new();

    out.push_str(&format!("Empiric Antibiotic Recommendation — {case_infection_type}\n"));
    out.push_str(&"=".repeat(60));
    out.push('\n');

    if let Some(category) = &recommendation.infection_category {
        out.push_str(&format!("Category: {category}\n"));
    }
    if let Some(route) = recommendation.route {
        out.push_str(&format!("Route: {route}\n"));
    }
    out.push_str(&format!("Allergy status: {}\n", recommendation.allergy_classification));
    out.push('\n');

    if recommendation.drugs.is_empty() {
        out.push_str("No regimen could be determined.\n");
    } else {
        out.push_str("Regimen:\n");
        for drug in &recommendation.drugs {
            out.push_str(&render_drug(drug));
        }
    }

    if !recommendation.rationale.is_empty() {
        out.push('\n');
        out.push_str("Rationale:\n");
        for line in &recommendation.rationale {
            out.push_str(&format!("  - {line}\n"));
        }
    }

    if !recommendation.monitoring.is_empty() {
        out.push('\n');
        out.push_str("Monitoring:\n");
        for item in &recommendation.monitoring {
            out.push_str(&format!("  - {item}\n"));
        }
    }

    if !recommendation.warnings.is_empty() {
        out.push('\n');
        out.push_str("Warnings:\n");
        for warning in &recommendation.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    if !recommendation.errors.is_empty() {
        out.push('\n');
        out.push_str("Errors:\n");
        for error in &recommendation.errors {
            out.push_str(&format!("  - {error}\n"));
        }
    }

    out
}

fn render_drug(drug: &DosedDrug) -> String {
    let mut line = format!("  - {} ({})", drug.drug_name, drug.class);

    // A calculated dose string already bakes in route and frequency
    // ("1500 mg IV q12h"); the guideline's raw `dose` field does not, so
    // route/frequency are only appended when the raw field is used.
    match drug.calculated_dose.as_ref().and_then(|c| c.maintenance_dose_calculated.as_deref()) {
        Some(calculated) => line.push_str(&format!(": {calculated}")),
        None => {
            if let Some(dose) = &drug.dose {
                line.push_str(&format!(": {dose}"));
            }
            if let Some(frequency) = &drug.frequency {
                line.push_str(&format!(" {frequency}"));
            }
            if let Some(route) = drug.route {
                line.push_str(&format!(" {route}"));
            }
        }
    }
    if let Some(duration) = &drug.duration {
        line.push_str(&format!(" for {duration}"));
    }
    line.push('\n');

    let loading = match drug.calculated_dose.as_ref().and_then(|c| c.loading_dose_calculated.as_deref()) {
        Some(calculated) => Some(calculated.to_string()),
        None => drug.loading_dose.clone(),
    };
    if let Some(loading) = loading {
        line.push_str(&format!("      Loading dose: {loading}\n"));
    }
    for note in &drug.notes {
        line.push_str(&format!("      Note: {note}\n"));
    }
    for warning in &drug.warnings {
        line.push_str(&format!("      Warning: {warning}\n"));
    }

    line
}
