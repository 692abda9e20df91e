//! Loads a guideline corpus from disk according to `index.json`'s
//! `loading_order`, then validates cross-references.

use std::fs;
use std::path::Path;

use abx_contracts::corpus::{CrossReferenceViolation, DrugDoc, GuidelineCorpus, IndexDoc, InfectionDoc, ValidationReport};
use abx_contracts::error::{AbxError, AbxResult};
use tracing::{debug, info, warn};

/// Read `index.json` plus every file or glob pattern in `loading_order`,
/// assembling the full corpus. Returns the corpus and a (possibly non-empty)
/// validation report — cross-reference violations are data, not failures.
pub fn load(root_dir: &Path) -> AbxResult<(GuidelineCorpus, ValidationReport)> {
    let index_path = root_dir.join("index.json");
    let index: IndexDoc = read_json(&index_path)?;

    info!(version = %index.version, path = %index_path.display(), "loaded guideline index");

    let mut infections = abx_contracts::collections::OrderedMap::new();
    let mut drugs = abx_contracts::collections::OrderedMap::new();
    let mut modifiers = abx_contracts::corpus::Modifiers::default();

    for pattern in &index.loading_order {
        if pattern.contains('*') {
            load_pattern(root_dir, pattern, &mut infections, &mut drugs, &mut modifiers)?;
        } else {
            load_single_file(root_dir, pattern, &mut infections, &mut drugs, &mut modifiers)?;
        }
    }

    let corpus = GuidelineCorpus {
        version: index.version.clone(),
        index,
        infections,
        drugs,
        modifiers,
    };

    let report = validate_cross_references(&corpus);
    if !report.is_clean() {
        warn!(violations = report.violations.len(), "cross-reference violations found in corpus");
    }

    info!(
        infections = corpus.infections.len(),
        drugs = corpus.drugs.len(),
        "guideline corpus loaded"
    );

    Ok((corpus, report))
}

fn load_pattern(
    root_dir: &Path,
    pattern: &str,
    infections: &mut abx_contracts::collections::OrderedMap<InfectionDoc>,
    drugs: &mut abx_contracts::collections::OrderedMap<DrugDoc>,
    modifiers: &mut abx_contracts::corpus::Modifiers,
) -> AbxResult<()> {
    let full_pattern = root_dir.join(pattern);
    let full_pattern_str = full_pattern.to_string_lossy().to_string();

    let mut paths: Vec<_> = glob::glob(&full_pattern_str)
        .map_err(|e| AbxError::InvalidCorpus { path: full_pattern_str.clone(), reason: e.to_string() })?
        .filter_map(Result::ok)
        .collect();
    paths.sort();

    for path in paths {
        let relative = path.strip_prefix(root_dir).unwrap_or(&path);
        load_single_file(root_dir, &relative.to_string_lossy(), infections, drugs, modifiers)?;
    }

    Ok(())
}

fn load_single_file(
    root_dir: &Path,
    relative_path: &str,
    infections: &mut abx_contracts::collections::OrderedMap<InfectionDoc>,
    drugs: &mut abx_contracts::collections::OrderedMap<DrugDoc>,
    modifiers: &mut abx_contracts::corpus::Modifiers,
) -> AbxResult<()> {
    let path = root_dir.join(relative_path);
    if !path.exists() {
        warn!(path = %path.display(), "guideline file listed in loading_order not found");
        return Ok(());
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    if relative_path.starts_with("infections") || relative_path.contains("infections/") {
        let doc: InfectionDoc = read_json(&path)?;
        debug!(infection_id = %stem, "loaded infection document");
        infections.insert(stem, doc);
    } else if relative_path.starts_with("drugs") || relative_path.contains("drugs/") {
        let doc: DrugDoc = read_json(&path)?;
        debug!(drug_id = %stem, "loaded drug document");
        drugs.insert(stem, doc);
    } else if relative_path.starts_with("modifiers") || relative_path.contains("modifiers/") {
        debug!(modifier = %stem, "loaded modifier document");
        match stem.as_str() {
            "allergy_rules" => modifiers.allergy_rules = read_json(&path)?,
            "pregnancy_rules" => modifiers.pregnancy_rules = read_json(&path)?,
            "renal_adjustment_rules" => modifiers.renal_adjustment_rules = read_json(&path)?,
            other => warn!(modifier = %other, "unrecognized modifier document, ignoring"),
        }
    } else {
        warn!(path = %relative_path, "unrecognized loading_order entry, ignoring");
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AbxResult<T> {
    let text = fs::read_to_string(path).map_err(|e| AbxError::InvalidCorpus {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| AbxError::InvalidCorpus {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Every drug id referenced by any infection regimen must exist in `drugs`.
fn validate_cross_references(corpus: &GuidelineCorpus) -> ValidationReport {
    let mut violations = Vec::new();

    for (infection_id, infection) in corpus.infections.iter() {
        for category in &infection.categories {
            for regimen in &category.regimens {
                for drug_id in &regimen.drugs {
                    if !corpus.drugs.contains_key(drug_id) {
                        violations.push(CrossReferenceViolation {
                            infection_id: infection_id.to_string(),
                            category: category.category.clone(),
                            drug_id: drug_id.clone(),
                        });
                    }
                }
            }
        }
    }

    ValidationReport { violations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn load_reports_cross_reference_violation_for_unknown_drug() {
        let dir = tempdir();

        write_file(
            dir.path(),
            "index.json",
            r#"{"version":"1.0","loading_order":["infections/*.json","drugs/*.json"]}"#,
        );
        write_file(
            dir.path(),
            "infections/uti.json",
            r#"{
                "infection_id": "uti",
                "categories": [{
                    "category": "cystitis",
                    "route": "PO",
                    "duration": null,
                    "regimens": [{
                        "allergy_status": "no_allergy",
                        "drugs": ["nonexistent_drug"],
                        "route": null,
                        "duration": null,
                        "reasoning": null,
                        "note": null
                    }]
                }]
            }"#,
        );

        let (_corpus, report) = load(dir.path()).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].drug_id, "nonexistent_drug");
    }

    /// Minimal stand-in for `tempfile::tempdir` — this crate doesn't pull in
    /// the dev-dependency elsewhere, so a scoped directory under `target/`
    /// keeps the test hermetic without adding a new dependency.
    struct TempDir(std::path::PathBuf);

    impl TempDir {
        fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn tempdir() -> TempDir {
        let path = std::env::temp_dir().join(format!("abx-repository-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        TempDir(path)
    }
}
