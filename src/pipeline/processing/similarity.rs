use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::processing::aggregate::VenueYearSummary;
use crate::pipeline::processing::multiset::Multiset;

/// Undirected weighted link between two venues of the same year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Which scores become edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgePolicy {
    pub threshold: f64,
    /// Keep scores equal to the threshold
    pub inclusive: bool,
}

impl Default for EdgePolicy {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            inclusive: false,
        }
    }
}

impl EdgePolicy {
    pub fn keeps(&self, score: f64) -> bool {
        if self.inclusive {
            score >= self.threshold
        } else {
            score > self.threshold
        }
    }
}

/// Jaccard index of two multisets: Σ min(a, b) / (|a| + |b| − Σ min(a, b)).
///
/// Two empty multisets score 0.
pub fn jaccard_index<K: Ord>(a: &Multiset<K>, b: &Multiset<K>) -> f64 {
    let intersection = a.intersection_size(b);
    let union = a.total() + b.total() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Score every unordered pair of venues in one year, O(n²·k).
pub fn venue_similarities(venues: &[&VenueYearSummary], policy: EdgePolicy) -> Vec<SimilarityEdge> {
    let mut edges = Vec::new();
    let mut compared = 0usize;
    for (i, a) in venues.iter().enumerate() {
        for b in &venues[i + 1..] {
            compared += 1;
            let score = jaccard_index(&a.artists, &b.artists);
            if policy.keeps(score) {
                edges.push(SimilarityEdge {
                    source: a.venue_name.clone(),
                    target: b.venue_name.clone(),
                    weight: score,
                });
            }
        }
    }
    debug!("Compared {} venue pairs, kept {} edges", compared, edges.len());
    metrics::counter!("club_network_venue_pairs_compared_total").increment(compared as u64);
    edges
}
