//! Corpus-level aggregation: one confidence vector shared by every query.
//!
//! Each iteration maps every query to its disagreement under the current
//! shared weights, reduces the per-ranker distances by summation, then
//! broadcasts a single inverse-distance update. The update happens only after
//! every query has contributed; the next iteration reads the new vector.

use std::hash::Hash;

use tracing::{debug, info};

use crate::aggregate::IterationStats;
use crate::borda::{consensus_order, consensus_ranks, weighted_borda};
use crate::config::AggregationConfig;
use crate::confidence::ConfidenceVector;
use crate::distance::{disagreement, Disagreement};
use crate::pool::DocumentPool;
use crate::{AggregationError, Result};

/// Mutable state threaded through corpus iterations.
///
/// Owned by one [`aggregate_corpus`] run and handed by reference to each
/// per-query pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusState {
    confidence: ConfidenceVector,
    iteration: usize,
}

impl CorpusState {
    /// Uniform weights over `rankers`, before any iteration.
    #[must_use]
    pub fn new(rankers: usize) -> Self {
        Self {
            confidence: ConfidenceVector::uniform(rankers),
            iteration: 0,
        }
    }

    /// Current shared confidence.
    #[must_use]
    pub fn confidence(&self) -> &ConfidenceVector {
        &self.confidence
    }

    /// Completed iterations.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Reduce per-query disagreements and apply one update.
    fn apply(&mut self, per_query: &[Disagreement]) -> IterationStats {
        let mut summed = vec![0.0; self.confidence.len()];
        let mut inversions = 0;
        for measured in per_query {
            for (total, d) in summed.iter_mut().zip(&measured.distances) {
                *total += d;
            }
            inversions += measured.inversions;
        }

        self.confidence = ConfidenceVector::inverse_distance(&summed);
        let stats = IterationStats {
            iteration: self.iteration,
            total_distance: summed.iter().sum(),
            inversions,
            kl_to_uniform: self.confidence.kl_to_uniform(),
        };
        self.iteration += 1;
        stats
    }
}

/// Result of [`aggregate_corpus`].
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusAggregation<I> {
    /// Final shared confidence per ranker.
    pub confidence: ConfidenceVector,
    /// Each query's consensus from the last iteration (byproduct).
    pub rankings: Vec<Vec<I>>,
    /// Iterations run.
    pub iterations: usize,
    /// One entry per iteration.
    pub history: Vec<IterationStats>,
}

/// Score every ranker against consensus across a whole query set.
///
/// Runs exactly `config.max_iters` iterations; there is no convergence check
/// in this mode. Every query must supply the same number of rankings, with
/// ranker `i` meaning the same candidate configuration everywhere.
///
/// # Errors
///
/// Any error aborts the whole run, since the shared vector is run-global:
/// [`AggregationError::InvalidConfig`], [`AggregationError::RankerCountMismatch`],
/// or [`AggregationError::Query`] wrapping a per-query pool error.
///
/// # Example
///
/// ```rust
/// use concord::{aggregate_corpus, AggregationConfig};
///
/// let corpus = vec![
///     vec![vec!["a", "b", "c"], vec!["b", "a", "c"], vec!["c", "b", "a"]],
///     vec![vec!["x", "y"], vec!["x", "y"], vec!["y", "x"]],
/// ];
/// let result = aggregate_corpus(&corpus, &AggregationConfig::default()).unwrap();
///
/// assert_eq!(result.confidence.len(), 3);
/// assert_eq!(result.iterations, 10);
/// ```
pub fn aggregate_corpus<I, L, Q>(
    queries: &[Q],
    config: &AggregationConfig,
) -> Result<CorpusAggregation<I>>
where
    I: Clone + Eq + Hash + Send + Sync,
    L: AsRef<[I]>,
    Q: AsRef<[L]>,
{
    config.validate()?;

    let rankers = queries.first().map_or(0, |q| q.as_ref().len());
    let mut pools = Vec::with_capacity(queries.len());
    for (query, rankings) in queries.iter().enumerate() {
        let rankings = rankings.as_ref();
        if rankings.len() != rankers {
            return Err(AggregationError::RankerCountMismatch {
                query,
                expected: rankers,
                found: rankings.len(),
            });
        }
        let pool = DocumentPool::build(rankings).map_err(|source| AggregationError::Query {
            query,
            source: Box::new(source),
        })?;
        pools.push(pool);
    }

    let mut state = CorpusState::new(rankers);
    let mut history = Vec::with_capacity(config.max_iters);
    let mut orders: Vec<Vec<usize>> = Vec::new();

    if rankers == 0 {
        debug!(queries = queries.len(), "no rankers in corpus");
        return Ok(CorpusAggregation {
            confidence: state.confidence,
            rankings: vec![Vec::new(); queries.len()],
            iterations: 0,
            history,
        });
    }

    for _ in 0..config.max_iters {
        let shared = state.confidence();
        let measured: Vec<(Disagreement, Vec<usize>)> =
            crate::map_queries(&pools, |pool| measure(pool, shared, config));
        let (per_query, last_orders): (Vec<_>, Vec<_>) = measured.into_iter().unzip();

        let stats = state.apply(&per_query);
        debug!(
            iteration = stats.iteration,
            total_distance = stats.total_distance,
            inversions = stats.inversions,
            kl_to_uniform = stats.kl_to_uniform,
            "corpus reweighted rankers"
        );
        history.push(stats);
        orders = last_orders;
    }

    info!(
        queries = pools.len(),
        rankers,
        iterations = state.iteration(),
        "corpus aggregation complete"
    );

    let rankings = pools
        .iter()
        .zip(&orders)
        .map(|(pool, order)| pool.resolve(order))
        .collect();

    Ok(CorpusAggregation {
        iterations: state.iteration(),
        confidence: state.confidence,
        rankings,
        history,
    })
}

/// One query's consensus under `confidence` and its per-ranker disagreement.
fn measure<I>(
    pool: &DocumentPool<I>,
    confidence: &ConfidenceVector,
    config: &AggregationConfig,
) -> (Disagreement, Vec<usize>) {
    let order = consensus_order(&weighted_borda(pool, confidence));
    let ranks = consensus_ranks(&order);
    let measured = disagreement(pool.rankings(), &ranks, config.metric, config.penalize_absent);
    (measured, order)
}
