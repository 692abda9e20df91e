//! `EvidenceCoordinator::evaluate`: sequential-tiered confidence-gated search
//! over pluggable reputable/broader source backends.

use std::sync::Arc;
use std::time::Duration;

use abx_contracts::error::AbxError;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Semaphore};
use tracing::warn;

use crate::source::{EvidenceSource, SourceHit};
use crate::tier::{self, Tier};

const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a single `evaluate` call: the tier entered, hits gathered per
/// tier, the confidence after boosting, and a human-readable trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceOutcome {
    pub tier: Option<Tier>,
    pub reputable_sources: Vec<SourceHit>,
    pub broader_sources: Vec<SourceHit>,
    pub final_confidence: f64,
    pub search_history: Vec<String>,
}

/// Bounded-concurrency, confidence-gated search over reputable and broader
/// evidence source backends. Absent sources (the default, `NullSource`-only
/// construction) make the coordinator a no-op that still exercises the
/// tiering and boost arithmetic.
pub struct EvidenceCoordinator {
    reputable_sources: Vec<Arc<dyn EvidenceSource>>,
    broader_sources: Vec<Arc<dyn EvidenceSource>>,
    concurrency: usize,
    timeout: Duration,
}

impl EvidenceCoordinator {
    pub fn new(reputable_sources: Vec<Arc<dyn EvidenceSource>>, broader_sources: Vec<Arc<dyn EvidenceSource>>) -> Self {
        Self { reputable_sources, broader_sources, concurrency: DEFAULT_CONCURRENCY, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_concurrency(mut self, permits: usize) -> Self {
        self.concurrency = permits;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the tier_0/tier_1/tier_2 state machine for `query` gated on
    /// `confidence`, honoring `cancel` for prompt abort.
    pub async fn evaluate(
        &self,
        confidence: f64,
        query: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<EvidenceOutcome, AbxError> {
        if *cancel.borrow() {
            return Err(AbxError::Cancelled);
        }

        let tier = tier::decide(confidence);
        let mut outcome = EvidenceOutcome { tier: Some(tier), final_confidence: confidence, ..Default::default() };

        if tier == Tier::Tier0TuhsOnly {
            outcome.search_history.push("high confidence - no external search needed".to_string());
            return Ok(outcome);
        }

        outcome.search_history.push("searching reputable medical sites".to_string());
        let reputable_hits = tokio::select! {
            biased;
            _ = cancel.changed() => return Err(AbxError::Cancelled),
            hits = self.search_all(&self.reputable_sources, query) => hits,
        };
        let n_reputable = reputable_hits.len();
        outcome.reputable_sources = reputable_hits;
        outcome.final_confidence = tier::apply_reputable_boost(outcome.final_confidence, n_reputable);
        outcome
            .search_history
            .push(format!("reputable search returned {n_reputable} sources, confidence now {:.2}", outcome.final_confidence));

        if tier == Tier::Tier1Reputable || !tier::needs_broader_search(outcome.final_confidence) {
            outcome.search_history.push("confidence sufficient - stopping before broader search".to_string());
            return Ok(outcome);
        }

        outcome.search_history.push("searching broader medical literature".to_string());
        let broader_hits = tokio::select! {
            biased;
            _ = cancel.changed() => return Err(AbxError::Cancelled),
            hits = self.search_all(&self.broader_sources, query) => hits,
        };
        let n_broader = broader_hits.len();
        outcome.broader_sources = broader_hits;
        outcome.final_confidence = tier::apply_broader_boost(outcome.final_confidence, n_broader);
        outcome
            .search_history
            .push(format!("broader search returned {n_broader} sources, final confidence {:.2}", outcome.final_confidence));

        Ok(outcome)
    }

    /// Run every source's `search` bounded by the concurrency semaphore and
    /// per-query timeout. A timed-out or erroring source contributes no
    /// hits and logs a warning; it never fails the overall evaluation.
    async fn search_all(&self, sources: &[Arc<dyn EvidenceSource>], query: &str) -> Vec<SourceHit> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let tasks = sources.iter().map(|source| {
            let source = Arc::clone(source);
            let semaphore = Arc::clone(&semaphore);
            let query = query.to_string();
            let timeout = self.timeout;
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                match tokio::time::timeout(timeout, source.search(&query)).await {
                    Ok(Ok(hits)) => hits,
                    Ok(Err(err)) => {
                        warn!(error = %err, "evidence source search failed");
                        Vec::new()
                    }
                    Err(_) => {
                        warn!("evidence source search timed out");
                        Vec::new()
                    }
                }
            }
        });

        join_all(tasks).await.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::NullSource;
    use abx_contracts::error::AbxResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    struct FixedSource(Vec<SourceHit>);

    #[async_trait]
    impl EvidenceSource for FixedSource {
        async fn search(&self, _query: &str) -> AbxResult<Vec<SourceHit>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl EvidenceSource for FailingSource {
        async fn search(&self, _query: &str) -> AbxResult<Vec<SourceHit>> {
            Err(AbxError::ExternalSearchFailure { reason: "simulated".to_string() })
        }
    }

    struct SlowSource;

    #[async_trait]
    impl EvidenceSource for SlowSource {
        async fn search(&self, _query: &str) -> AbxResult<Vec<SourceHit>> {
            tokio::time::sleep(StdDuration::from_secs(60)).await;
            Ok(vec![])
        }
    }

    fn hit(name: &str) -> SourceHit {
        SourceHit {
            source_name: name.to_string(),
            title: "title".to_string(),
            url: None,
            relevance_score: 0.8,
            key_finding: "finding".to_string(),
            publication_date: None,
        }
    }

    #[tokio::test]
    async fn high_confidence_skips_all_search() {
        let coordinator = EvidenceCoordinator::new(vec![Arc::new(NullSource)], vec![Arc::new(NullSource)]);
        let (_tx, rx) = watch::channel(false);
        let outcome = coordinator.evaluate(0.9, "query", rx).await.unwrap();
        assert_eq!(outcome.tier, Some(Tier::Tier0TuhsOnly));
        assert!(outcome.reputable_sources.is_empty());
        assert_eq!(outcome.final_confidence, 0.9);
    }

    #[tokio::test]
    async fn moderate_confidence_searches_reputable_only() {
        let reputable: Vec<Arc<dyn EvidenceSource>> = vec![Arc::new(FixedSource(vec![hit("IDSA"), hit("CDC")]))];
        let coordinator = EvidenceCoordinator::new(reputable, vec![Arc::new(NullSource)]);
        let (_tx, rx) = watch::channel(false);
        let outcome = coordinator.evaluate(0.70, "query", rx).await.unwrap();
        assert_eq!(outcome.tier, Some(Tier::Tier1Reputable));
        assert_eq!(outcome.reputable_sources.len(), 2);
        assert!(outcome.broader_sources.is_empty());
        assert!((outcome.final_confidence - 0.80).abs() < 1e-9);
    }

    #[tokio::test]
    async fn low_confidence_falls_through_to_broader_search() {
        let reputable: Vec<Arc<dyn EvidenceSource>> = vec![Arc::new(FixedSource(vec![hit("IDSA")]))];
        let broader: Vec<Arc<dyn EvidenceSource>> = vec![Arc::new(FixedSource(vec![hit("PubMed"), hit("PubMed2")]))];
        let coordinator = EvidenceCoordinator::new(reputable, broader);
        let (_tx, rx) = watch::channel(false);
        let outcome = coordinator.evaluate(0.40, "query", rx).await.unwrap();
        assert_eq!(outcome.tier, Some(Tier::Tier2Broader));
        assert_eq!(outcome.reputable_sources.len(), 1);
        assert_eq!(outcome.broader_sources.len(), 2);
    }

    #[tokio::test]
    async fn reputable_boost_sufficient_skips_broader_despite_tier2_entry() {
        let reputable: Vec<Arc<dyn EvidenceSource>> =
            vec![Arc::new(FixedSource(vec![hit("a"), hit("b"), hit("c"), hit("d")]))];
        let broader: Vec<Arc<dyn EvidenceSource>> = vec![Arc::new(FixedSource(vec![hit("PubMed")]))];
        let coordinator = EvidenceCoordinator::new(reputable, broader);
        let (_tx, rx) = watch::channel(false);
        // 0.55 + min(4*0.05, 0.15) = 0.70 >= 0.6 threshold, so broader is skipped.
        let outcome = coordinator.evaluate(0.55, "query", rx).await.unwrap();
        assert!(outcome.broader_sources.is_empty());
        assert!((outcome.final_confidence - 0.70).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failing_source_contributes_no_hits() {
        let reputable: Vec<Arc<dyn EvidenceSource>> = vec![Arc::new(FailingSource)];
        let coordinator = EvidenceCoordinator::new(reputable, vec![Arc::new(NullSource)]);
        let (_tx, rx) = watch::channel(false);
        let outcome = coordinator.evaluate(0.70, "query", rx).await.unwrap();
        assert!(outcome.reputable_sources.is_empty());
        assert_eq!(outcome.final_confidence, 0.70);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_source_contributes_no_hits() {
        let reputable: Vec<Arc<dyn EvidenceSource>> = vec![Arc::new(SlowSource)];
        let coordinator =
            EvidenceCoordinator::new(reputable, vec![Arc::new(NullSource)]).with_timeout(StdDuration::from_millis(10));
        let (_tx, rx) = watch::channel(false);
        let outcome = coordinator.evaluate(0.70, "query", rx).await.unwrap();
        assert!(outcome.reputable_sources.is_empty());
    }

    #[tokio::test]
    async fn cancellation_before_search_returns_cancelled() {
        let coordinator = EvidenceCoordinator::new(vec![Arc::new(NullSource)], vec![Arc::new(NullSource)]);
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let result = coordinator.evaluate(0.70, "query", rx).await;
        assert!(matches!(result, Err(AbxError::Cancelled)));
    }

    #[tokio::test]
    async fn bounded_concurrency_never_exceeds_configured_permits() {
        struct CountingSource(Arc<AtomicUsize>, Arc<AtomicUsize>);
        #[async_trait]
        impl EvidenceSource for CountingSource {
            async fn search(&self, _query: &str) -> AbxResult<Vec<SourceHit>> {
                let current = self.0.fetch_add(1, Ordering::SeqCst) + 1;
                self.1.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(StdDuration::from_millis(20)).await;
                self.0.fetch_sub(1, Ordering::SeqCst);
                Ok(vec![])
            }
        }

        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let reputable: Vec<Arc<dyn EvidenceSource>> = (0..8)
            .map(|_| Arc::new(CountingSource(Arc::clone(&in_flight), Arc::clone(&max_seen))) as Arc<dyn EvidenceSource>)
            .collect();
        let coordinator = EvidenceCoordinator::new(reputable, vec![]).with_concurrency(2);
        let (_tx, rx) = watch::channel(false);
        coordinator.evaluate(0.70, "query", rx).await.unwrap();
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }
}
