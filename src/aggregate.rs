//! Query-level aggregation.
//!
//! ```text
//! Init ──> Iterating ──┬──> Converged          (order unchanged between rounds)
//!                      └──> MaxItersExhausted  (cap reached, non-fatal)
//! ```
//!
//! Each round scores the pool with the current confidence, compares the
//! resulting order with the previous round's, and only if it changed measures
//! disagreement and reweights with `exp(-distance)`.

use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::borda::{consensus_order, consensus_ranks, weighted_borda};
use crate::config::AggregationConfig;
use crate::confidence::ConfidenceVector;
use crate::distance::disagreement;
use crate::pool::DocumentPool;
use crate::Result;

/// Diagnostics for one reweighting round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    /// 0-based round index.
    pub iteration: usize,
    /// Sum of per-ranker distances this round.
    pub total_distance: f64,
    /// Inversions counted across all rankers (and queries, in corpus mode).
    pub inversions: usize,
    /// KL divergence of the updated confidence from uniform.
    pub kl_to_uniform: f64,
}

/// Result of [`aggregate_query`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAggregation<I> {
    /// Final normalised confidence per ranker.
    pub confidence: ConfidenceVector,
    /// Consensus ranking, best first.
    pub ranking: Vec<I>,
    /// Whether the order stopped changing before the cap.
    pub converged: bool,
    /// Scoring rounds executed (including the one that detected convergence).
    pub iterations: usize,
    /// One entry per reweighting round.
    pub history: Vec<IterationStats>,
}

impl<I> QueryAggregation<I> {
    /// Index of the most trusted ranker.
    #[must_use]
    pub fn best_ranker(&self) -> Option<usize> {
        self.confidence.argmax()
    }
}

/// Fuse one query's rankings into a consensus and a confidence per ranker.
///
/// # Arguments
///
/// * `rankings` - one ranking per candidate configuration, best first
/// * `config` - iteration cap, distance metric, absence penalty
///
/// # Returns
///
/// Confidence vector, consensus ranking and a convergence flag. Hitting the
/// iteration cap is not an error: the last order and weights are returned with
/// `converged == false`. No rankings (or no documents) yields an empty
/// ranking and the uniform vector.
///
/// # Errors
///
/// [`crate::AggregationError::InvalidConfig`] for a zero iteration cap,
/// [`crate::AggregationError::DuplicateDocument`] if a ranking repeats an id.
///
/// # Example
///
/// ```rust
/// use concord::{aggregate_query, AggregationConfig};
///
/// let rankings = vec![
///     vec!["a", "b", "c"],
///     vec!["b", "a", "c"],
///     vec!["a", "c", "b"],
/// ];
/// let result = aggregate_query(&rankings, &AggregationConfig::default()).unwrap();
///
/// assert_eq!(result.ranking, vec!["a", "b", "c"]);
/// assert!(result.converged);
/// // The first ranker matches the consensus exactly.
/// assert_eq!(result.best_ranker(), Some(0));
/// ```
pub fn aggregate_query<I, L>(
    rankings: &[L],
    config: &AggregationConfig,
) -> Result<QueryAggregation<I>>
where
    I: Clone + Eq + Hash,
    L: AsRef<[I]>,
{
    config.validate()?;
    let pool = DocumentPool::build(rankings)?;
    Ok(aggregate_pool(&pool, config))
}

/// Query-level aggregation over many independent queries.
///
/// Queries share nothing, so with the `parallel` feature they run on the rayon
/// pool. Results come back in input order, one `Result` per query: a failing
/// query never affects the others.
pub fn aggregate_queries<I, L, Q>(
    queries: &[Q],
    config: &AggregationConfig,
) -> Vec<Result<QueryAggregation<I>>>
where
    I: Clone + Eq + Hash + Send + Sync,
    L: AsRef<[I]>,
    Q: AsRef<[L]> + Sync,
{
    crate::map_queries(queries, |rankings| aggregate_query(rankings.as_ref(), config))
}

/// Run the iteration on an already built pool.
pub(crate) fn aggregate_pool<I: Clone>(
    pool: &DocumentPool<I>,
    config: &AggregationConfig,
) -> QueryAggregation<I> {
    let mut confidence = ConfidenceVector::uniform(pool.num_rankers());
    if pool.is_empty() {
        debug!(rankers = pool.num_rankers(), "empty document pool");
        return QueryAggregation {
            confidence,
            ranking: Vec::new(),
            converged: true,
            iterations: 0,
            history: Vec::new(),
        };
    }

    let mut previous: Option<Vec<usize>> = None;
    let mut history = Vec::new();
    let mut converged = false;
    let mut iterations = 0;

    while iterations < config.max_iters {
        let iteration = iterations;
        iterations += 1;

        let order = consensus_order(&weighted_borda(pool, &confidence));
        if previous.as_ref() == Some(&order) {
            info!(iteration, "consensus converged");
            converged = true;
            break;
        }

        let ranks = consensus_ranks(&order);
        let measured = disagreement(pool.rankings(), &ranks, config.metric, config.penalize_absent);
        confidence = ConfidenceVector::exponential_decay(&measured.distances);

        let stats = IterationStats {
            iteration,
            total_distance: measured.total(),
            inversions: measured.inversions,
            kl_to_uniform: confidence.kl_to_uniform(),
        };
        debug!(
            iteration,
            total_distance = stats.total_distance,
            inversions = stats.inversions,
            kl_to_uniform = stats.kl_to_uniform,
            "reweighted rankers"
        );
        history.push(stats);
        previous = Some(order);
    }

    if !converged {
        warn!(max_iters = config.max_iters, "consensus not converged");
    }

    QueryAggregation {
        confidence,
        ranking: previous.map(|order| pool.resolve(&order)).unwrap_or_default(),
        converged,
        iterations,
        history,
    }
}
