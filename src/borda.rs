//! Confidence-weighted Borda count over a [`DocumentPool`].

use crate::confidence::ConfidenceVector;
use crate::pool::DocumentPool;

/// Weighted Borda score per handle.
///
/// # Formula
///
/// `score(d) = Σ confidence[ranker] * (len - position)` over every ranking
/// that lists `d`. Rankings that omit `d` contribute nothing.
///
/// Rankers whose index falls outside `confidence` contribute nothing either;
/// callers size the vector with [`DocumentPool::num_rankers`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn weighted_borda<I>(pool: &DocumentPool<I>, confidence: &ConfidenceVector) -> Vec<f64> {
    pool.position_index()
        .iter()
        .map(|appearances| {
            appearances
                .iter()
                .map(|p| confidence.get(p.ranker).unwrap_or(0.0) * p.credit() as f64)
                .sum()
        })
        .collect()
}

/// Consensus order: handles by descending score, ties by ascending handle.
///
/// Lower handles are more frequent across rankers, so ties favour documents
/// more rankers agreed to list. Uses `f64::total_cmp` so the order is total
/// even with NaN.
#[must_use]
pub fn consensus_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    order
}

/// Invert an order into a rank per handle (0 = top).
#[must_use]
pub fn consensus_ranks(order: &[usize]) -> Vec<usize> {
    let mut ranks = vec![0; order.len()];
    for (rank, &handle) in order.iter().enumerate() {
        ranks[handle] = rank;
    }
    ranks
}
