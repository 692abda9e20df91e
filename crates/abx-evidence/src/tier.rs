//! The tier_0/tier_1/tier_2 confidence-gated state machine (spec §4.8).

use serde::{Deserialize, Serialize};

/// Which tier the coordinator entered for a given confidence input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// `confidence >= 0.8`: no external search.
    Tier0TuhsOnly,
    /// `0.6 <= confidence < 0.8`: reputable sites only.
    Tier1Reputable,
    /// `confidence < 0.6`: reputable, then broader if still below 0.6.
    Tier2Broader,
}

const TIER_1_THRESHOLD: f64 = 0.8;
const TIER_2_THRESHOLD: f64 = 0.6;

const REPUTABLE_BOOST_PER_SOURCE: f64 = 0.05;
const REPUTABLE_BOOST_CAP: f64 = 0.15;
const BROADER_BOOST_PER_SOURCE: f64 = 0.03;
const BROADER_BOOST_CAP: f64 = 0.10;

/// Decide which tier a confidence value falls into.
pub fn decide(confidence: f64) -> Tier {
    if confidence >= TIER_1_THRESHOLD {
        Tier::Tier0TuhsOnly
    } else if confidence >= TIER_2_THRESHOLD {
        Tier::Tier1Reputable
    } else {
        Tier::Tier2Broader
    }
}

/// Confidence boost from `n` reputable-tier hits, capped at 0.15, and the
/// resulting confidence capped at 1.0.
pub fn apply_reputable_boost(confidence: f64, n_sources: usize) -> f64 {
    let boost = (n_sources as f64 * REPUTABLE_BOOST_PER_SOURCE).min(REPUTABLE_BOOST_CAP);
    (confidence + boost).min(1.0)
}

/// Confidence boost from `n` broader-tier hits, capped at 0.10, and the
/// resulting confidence capped at 1.0.
pub fn apply_broader_boost(confidence: f64, n_sources: usize) -> f64 {
    let boost = (n_sources as f64 * BROADER_BOOST_PER_SOURCE).min(BROADER_BOOST_CAP);
    (confidence + boost).min(1.0)
}

/// Whether post-reputable-boost confidence still needs the broader tier.
pub fn needs_broader_search(confidence: f64) -> bool {
    confidence < TIER_2_THRESHOLD
}
