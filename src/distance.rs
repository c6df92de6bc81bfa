//! Pairwise disagreement between each ranker and the consensus.
//!
//! For ranker `r` with local order `r[0..k]`, every pair `a < b` where the
//! consensus places `r[a]` below `r[b]` is an inversion. Plain Kendall-Tau
//! counts each inversion as 1; the discounted variant charges
//! `1/log2(rank(r[b]) + 2) - 1/log2(rank(r[a]) + 2)`, so inversions near the
//! top of the consensus cost more.
//!
//! Cost is O(k²) per ranker per iteration and dominates aggregation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AggregationError;

/// Distance used to compare a ranker against the consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DistanceMetric {
    /// Plain Kendall-Tau: every inversion costs 1.
    #[default]
    KendallTau,
    /// Kendall-Tau weighted by a DCG-style discount on consensus rank.
    DiscountedKendallTau,
}

impl DistanceMetric {
    /// Canonical identifier (`"KT"` or `"dKT"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KendallTau => "KT",
            Self::DiscountedKendallTau => "dKT",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KT" | "kt" | "kendall_tau" => Ok(Self::KendallTau),
            "dKT" | "dkt" | "discounted_kt" | "discounted_kendall_tau" => {
                Ok(Self::DiscountedKendallTau)
            }
            other => Err(AggregationError::UnknownMetric(other.to_string())),
        }
    }
}

impl TryFrom<String> for DistanceMetric {
    type Error = AggregationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DistanceMetric> for String {
    fn from(metric: DistanceMetric) -> Self {
        metric.as_str().to_string()
    }
}

/// Discount charged for an inversion between consensus ranks `upper < lower`.
///
/// `1/log2(upper + 2) - 1/log2(lower + 2)`; always positive when
/// `upper < lower`.
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn discount(upper: usize, lower: usize) -> f64 {
    1.0 / (upper as f64 + 2.0).log2() - 1.0 / (lower as f64 + 2.0).log2()
}

/// Discounts memoised per unordered pair of consensus ranks.
///
/// The same pair recurs across rankers within one estimate. Lives for a
/// single [`disagreement`] call.
#[derive(Debug, Default)]
struct DiscountCache {
    discounts: HashMap<(usize, usize), f64>,
}

impl DiscountCache {
    fn get(&mut self, rank_a: usize, rank_b: usize) -> f64 {
        let key = (rank_a.min(rank_b), rank_a.max(rank_b));
        *self
            .discounts
            .entry(key)
            .or_insert_with(|| discount(key.0, key.1))
    }
}

/// Per-ranker distances from one estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Disagreement {
    /// Distance per ranker, indexed like the input rankings.
    pub distances: Vec<f64>,
    /// Inversions counted across all rankers.
    pub inversions: usize,
}

impl Disagreement {
    /// Sum of all per-ranker distances.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.distances.iter().sum()
    }
}

/// Measure every ranker's disagreement with the consensus.
///
/// * `rankings` - local orders in handles (see [`crate::DocumentPool::rankings`])
/// * `ranks` - consensus rank per handle (see [`crate::borda::consensus_ranks`])
/// * `penalize_absent` - also treat "listed above unlisted" as an implicit
///   preference; off in the standard algorithm
///
/// # Example
///
/// ```rust
/// use concord::distance::{disagreement, DistanceMetric};
///
/// // Consensus is [0, 1]; the second ranker swaps them.
/// let d = disagreement(&[vec![0, 1], vec![1, 0]], &[0, 1], DistanceMetric::KendallTau, false);
/// assert_eq!(d.distances, vec![0.0, 1.0]);
/// ```
#[must_use]
pub fn disagreement(
    rankings: &[Vec<usize>],
    ranks: &[usize],
    metric: DistanceMetric,
    penalize_absent: bool,
) -> Disagreement {
    let mut cache = DiscountCache::default();
    let mut inversions = 0;
    let mut charge = |upper: usize, lower: usize| -> f64 {
        inversions += 1;
        match metric {
            DistanceMetric::KendallTau => 1.0,
            DistanceMetric::DiscountedKendallTau => cache.get(upper, lower),
        }
    };

    let mut distances = Vec::with_capacity(rankings.len());
    for local in rankings {
        let mut distance = 0.0;
        for (a, &doc_a) in local.iter().enumerate() {
            let pi_a = ranks[doc_a];
            for &doc_b in &local[a + 1..] {
                let pi_b = ranks[doc_b];
                if pi_a > pi_b {
                    distance += charge(pi_b, pi_a);
                }
            }
        }

        if penalize_absent {
            let mut listed = vec![false; ranks.len()];
            for &doc in local {
                listed[doc] = true;
            }
            for &doc in local {
                let pi_listed = ranks[doc];
                for (other, &pi_other) in ranks.iter().enumerate() {
                    if !listed[other] && pi_other < pi_listed {
                        distance += charge(pi_other, pi_listed);
                    }
                }
            }
        }

        distances.push(distance);
    }

    Disagreement {
        distances,
        inversions,
    }
}
