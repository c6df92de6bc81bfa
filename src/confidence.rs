//! Per-ranker confidence weights and the two update rules.
//!
//! Query-level aggregation uses exponential decay (`exp(-d)`); corpus-level
//! aggregation uses inverse distance (`1/d`). The two forms produce different
//! weight vectors for the same distances.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Floor applied to summed distances in [`ConfidenceVector::inverse_distance`].
///
/// A ranker that never disagrees anywhere would otherwise get `1/0`.
pub const DISTANCE_FLOOR: f64 = 1e-9;

/// Normalised per-ranker weights: non-negative, summing to 1.
///
/// An empty vector (no rankers) is valid and sums to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceVector(Vec<f64>);

impl ConfidenceVector {
    /// `1/p` for each of `p` rankers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn uniform(p: usize) -> Self {
        Self(vec![1.0 / p as f64; p])
    }

    /// Per-query update: `exp(-distance)`, normalised.
    ///
    /// A ranker with zero distance gets weight exactly 1 before normalisation.
    /// If every weight underflows to zero the exponent is shifted by the
    /// smallest distance, which leaves the normalised result unchanged.
    #[must_use]
    pub fn exponential_decay(distances: &[f64]) -> Self {
        let mut weights: Vec<f64> = distances.iter().map(|d| (-d).exp()).collect();
        if !distances.is_empty() && weights.iter().sum::<f64>() == 0.0 {
            let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
            weights = distances.iter().map(|d| (min - d).exp()).collect();
        }
        Self::normalized(weights)
    }

    /// Corpus-level update: `1 / summed_distance`, normalised.
    ///
    /// Distances below [`DISTANCE_FLOOR`] are raised to it, so a ranker that
    /// never disagrees dominates without producing infinities or NaN.
    #[must_use]
    pub fn inverse_distance(summed_distances: &[f64]) -> Self {
        let floored = summed_distances
            .iter()
            .filter(|&&d| d < DISTANCE_FLOOR)
            .count();
        if floored > 0 {
            warn!(
                floored,
                floor = DISTANCE_FLOOR,
                "rankers with zero summed distance; flooring before inversion"
            );
        }
        let weights = summed_distances
            .iter()
            .map(|&d| 1.0 / d.max(DISTANCE_FLOOR))
            .collect();
        Self::normalized(weights)
    }

    /// Divide by the sum. Falls back to uniform when the sum is not a
    /// positive finite number.
    fn normalized(mut weights: Vec<f64>) -> Self {
        if weights.is_empty() {
            return Self(weights);
        }
        let z: f64 = weights.iter().sum();
        if !(z.is_finite() && z > 0.0) {
            warn!(normalizer = z, "degenerate confidence weights; resetting to uniform");
            return Self::uniform(weights.len());
        }
        debug!(normalizer = z, "normalised confidence");
        for w in &mut weights {
            *w /= z;
        }
        Self(weights)
    }

    /// Number of rankers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no rankers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Weight of `ranker`.
    #[must_use]
    pub fn get(&self, ranker: usize) -> Option<f64> {
        self.0.get(ranker).copied()
    }

    /// Weights as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consume into the underlying weights.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Ranker with the highest weight; ties go to the lowest index.
    #[must_use]
    pub fn argmax(&self) -> Option<usize> {
        self.0
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &w)| match best {
                Some((_, bw)) if bw >= w => best,
                _ => Some((i, w)),
            })
            .map(|(i, _)| i)
    }

    /// KL divergence (natural log) from the uniform distribution.
    ///
    /// 0 when every ranker is trusted equally; grows as weight concentrates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn kl_to_uniform(&self) -> f64 {
        let p = self.0.len() as f64;
        self.0
            .iter()
            .filter(|&&w| w > 0.0)
            .map(|&w| w * (w * p).ln())
            .sum()
    }
}

impl Index<usize> for ConfidenceVector {
    type Output = f64;

    fn index(&self, ranker: usize) -> &f64 {
        &self.0[ranker]
    }
}

impl AsRef<[f64]> for ConfidenceVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}
