//! Ranks candidate nodes for a replica.
//!
//! The score mixes two terms:
//! - **Capacity**: headroom left on cpu, memory and storage after the replica is placed. Spare
//!   headroom spreads load instead of hot-spotting one node.
//! - **Latency**: how far below the service's latency budget the node sits.

use std::cmp::Ordering;

use crate::domain::node::node::Node;
use crate::domain::resource::capacity::{Requirements, ratio};
use crate::domain::utils::id::NodeId;
use crate::error::ConversionError;

/// Scores closer than this are treated as equal and fall through to the tie-breakers.
pub const SCORE_EPSILON: f64 = 1e-6;

/// Weights for the scoring components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub capacity: f64,
    pub latency: f64,
}

impl ScoringWeights {
    pub fn new(capacity: f64, latency: f64) -> Result<Self, ConversionError> {
        let valid = capacity.is_finite() && latency.is_finite() && capacity >= 0.0 && latency >= 0.0 && capacity + latency > 0.0;
        if !valid {
            return Err(ConversionError::InvalidScoringWeights);
        }
        Ok(Self { capacity, latency })
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self { capacity: 0.6, latency: 0.4 }
    }
}

/// Score of one node for one service at decision time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementScore {
    pub node_id: NodeId,
    /// Weighted total in `[0, 1]`, higher is better.
    pub score: f64,
    pub capacity_score: f64,
    pub latency_score: f64,
    /// Mean utilization fraction of the node before placement, used as tie-breaker.
    pub utilization: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PlacementScorer {
    weights: ScoringWeights,
}

impl PlacementScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, node: &Node, requirements: &Requirements) -> f64 {
        self.evaluate(node, requirements).score
    }

    pub fn evaluate(&self, node: &Node, requirements: &Requirements) -> PlacementScore {
        let capacity_score = Self::capacity_score(node, requirements);
        let latency_score = Self::latency_score(node.latency_ms, requirements.max_latency_ms);

        let total_weight = self.weights.capacity + self.weights.latency;
        let score = (self.weights.capacity * capacity_score + self.weights.latency * latency_score) / total_weight;

        PlacementScore {
            node_id: node.id.clone(),
            score: score.clamp(0.0, 1.0),
            capacity_score,
            latency_score,
            utilization: node.get_utilization_ratio(),
        }
    }

    /// Scores all candidates and orders them best first.
    ///
    /// Every pick is made among the candidates within [`SCORE_EPSILON`] of the best remaining
    /// score. Among those the less utilized node wins, then the smaller node id.
    pub fn rank(&self, candidates: &[&Node], requirements: &Requirements) -> Vec<PlacementScore> {
        let mut remaining: Vec<PlacementScore> = candidates.iter().map(|node| self.evaluate(node, requirements)).collect();
        remaining.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut ranked = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let best = remaining[0].score;
            let pick = remaining
                .iter()
                .enumerate()
                .take_while(|(_, candidate)| best - candidate.score <= SCORE_EPSILON)
                .min_by(|(_, a), (_, b)| Self::break_tie(a, b))
                .map_or(0, |(index, _)| index);

            ranked.push(remaining.remove(pick));
        }

        ranked
    }

    fn break_tie(a: &PlacementScore, b: &PlacementScore) -> Ordering {
        a.utilization.total_cmp(&b.utilization).then_with(|| a.node_id.cmp(&b.node_id))
    }

    /// Mean headroom fraction over cpu, memory and storage after a tentative reservation.
    fn capacity_score(node: &Node, requirements: &Requirements) -> f64 {
        let remaining = node.get_available_capacity().saturating_sub(&requirements.demand());

        (ratio(remaining.cpu, node.capacity.cpu) + ratio(remaining.memory, node.capacity.memory) + ratio(remaining.storage, node.capacity.storage))
            / 3.0
    }

    fn latency_score(latency_ms: u64, max_latency_ms: u64) -> f64 {
        if max_latency_ms == 0 {
            return if latency_ms == 0 { 1.0 } else { 0.0 };
        }
        (1.0 - latency_ms as f64 / max_latency_ms as f64).clamp(0.0, 1.0)
    }
}
