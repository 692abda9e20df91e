//! `GuidelineRepository`: owns the shared corpus and serializes reloads
//! without ever locking the read path.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use abx_contracts::corpus::{AllergyStatus, DrugDoc, GuidelineCorpus, ValidationReport};
use abx_contracts::error::AbxResult;
use arc_swap::ArcSwap;
use tracing::info;

use crate::loader;
use crate::queries::{self, ResolvedDose, ResolvedRegimen};

/// Process-wide handle to the guideline corpus.
///
/// Readers call [`GuidelineRepository::current`] and work against an
/// `Arc<GuidelineCorpus>` snapshot with no locking. [`reload`] builds a new
/// corpus off to the side and atomically swaps the shared reference;
/// in-flight queries keep running against the snapshot they already hold.
pub struct GuidelineRepository {
    current: ArcSwap<GuidelineCorpus>,
    root_dir: PathBuf,
    reload_lock: Mutex<()>,
}

impl GuidelineRepository {
    /// Load the corpus at `root_dir` and construct a repository around it.
    pub fn load(root_dir: impl Into<PathBuf>) -> AbxResult<(Self, ValidationReport)> {
        let root_dir = root_dir.into();
        let (corpus, report) = loader::load(&root_dir)?;
        let repo = Self {
            current: ArcSwap::from_pointee(corpus),
            root_dir,
            reload_lock: Mutex::new(()),
        };
        Ok((repo, report))
    }

    /// The current corpus snapshot. Lock-free.
    pub fn current(&self) -> Arc<GuidelineCorpus> {
        self.current.load_full()
    }

    /// Rebuild the corpus from disk and atomically swap it in.
    ///
    /// Serialized against concurrent reloads via `reload_lock`; readers
    /// never touch this mutex.
    pub fn reload(&self) -> AbxResult<ValidationReport> {
        let _guard = self.reload_lock.lock().expect("reload lock poisoned");
        let (corpus, report) = loader::load(&self.root_dir)?;
        info!(version = %corpus.version, "guideline corpus reloaded");
        self.current.store(Arc::new(corpus));
        Ok(report)
    }

    pub fn infection_regimens(
        &self,
        infection_id: &str,
        subcategory: Option<&str>,
        allergy_status: AllergyStatus,
    ) -> Vec<ResolvedRegimen> {
        queries::infection_regimens(&self.current(), infection_id, subcategory, allergy_status)
    }

    pub fn drug_dose(&self, drug_id: &str, indication: &str, crcl: Option<f64>) -> AbxResult<ResolvedDose> {
        queries::drug_dose(&self.current(), drug_id, indication, crcl)
    }

    pub fn check_pregnancy_safe(&self, drug_id: &str, trimester: Option<u8>) -> (bool, Option<String>) {
        queries::check_pregnancy_safe(&self.current(), drug_id, trimester)
    }

    pub fn classify_allergy_severity(&self, text: &str) -> &'static str {
        queries::classify_allergy_severity(&self.current(), text)
    }

    pub fn critical_rules(&self, infection_id: &str) -> Vec<String> {
        queries::critical_rules(&self.current(), infection_id)
    }

    pub fn all_drug_ids(&self) -> Vec<String> {
        queries::all_drug_ids(&self.current()).into_iter().map(str::to_string).collect()
    }

    pub fn drug(&self, drug_id: &str) -> Option<DrugDoc> {
        queries::drug(&self.current(), drug_id).cloned()
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.root_dir
    }
}

/// Test-only helpers for building a `GuidelineRepository` around an in-memory
/// corpus, without touching disk. Used by `abx-rules`/`abx-dosing` unit tests
/// that need a repository handle but only care about a handful of fields.
#[doc(hidden)]
pub mod test_support {
    use super::*;

    pub fn from_corpus(corpus: GuidelineCorpus) -> GuidelineRepository {
        GuidelineRepository {
            current: ArcSwap::from_pointee(corpus),
            root_dir: PathBuf::new(),
            reload_lock: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    struct TempDir(PathBuf);
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
    fn tempdir(name: &str) -> TempDir {
        let path = std::env::temp_dir().join(format!("abx-repository-repo-test-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        TempDir(path)
    }
    fn write_file(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    fn minimal_corpus(dir: &Path, version: &str) {
        write_file(dir, "index.json", &format!(r#"{{"version":"{version}","loading_order":[]}}"#));
    }

    #[test]
    fn reload_swaps_in_new_corpus_without_blocking_readers() {
        let dir = tempdir("reload");
        minimal_corpus(dir.path(), "1.0.0");

        let (repo, _report) = GuidelineRepository::load(dir.path()).unwrap();
        assert_eq!(repo.current().version, "1.0.0");

        minimal_corpus(dir.path(), "2.0.0");
        repo.reload().unwrap();
        assert_eq!(repo.current().version, "2.0.0");
    }
}
