//! Pluggable evidence source backends.

use abx_contracts::error::AbxResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single piece of evidence returned by a source search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHit {
    pub source_name: String,
    pub title: String,
    pub url: Option<String>,
    pub relevance_score: f64,
    pub key_finding: String,
    pub publication_date: Option<String>,
}

/// A searchable evidence backend — reputable-tier (IDSA/CDC/WHO/UpToDate) or
/// broader-tier (PubMed, scholarly search). The core ships only [`NullSource`];
/// a hosting application wires in real HTTP-backed implementations.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    async fn search(&self, query: &str) -> AbxResult<Vec<SourceHit>>;
}

/// Always returns no hits. Used when no external credentials are configured,
/// keeping the coordinator's tiering logic exercisable without network I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSource;

#[async_trait]
impl EvidenceSource for NullSource {
    async fn search(&self, _query: &str) -> AbxResult<Vec<SourceHit>> {
        Ok(Vec::new())
    }
}
