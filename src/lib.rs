//! Unsupervised rank aggregation with per-ranker confidence.
//!
//! Fuse the rankings produced by many candidate configurations of a retrieval
//! system into one consensus, and learn how much to trust each configuration
//! from how often it disagrees with that consensus. No relevance judgments are
//! needed.
//!
//! ```rust
//! use concord::{aggregate_query, AggregationConfig};
//!
//! let rankings = vec![
//!     vec!["d1", "d2", "d3"],
//!     vec!["d2", "d1", "d3"],
//!     vec!["d1", "d3", "d2"],
//! ];
//! let result = aggregate_query(&rankings, &AggregationConfig::default()).unwrap();
//!
//! assert_eq!(result.ranking, vec!["d1", "d2", "d3"]);
//! assert_eq!(result.best_ranker(), Some(0));
//! ```
//!
//! # Pipeline
//!
//! | Stage | Item | Role |
//! |-------|------|------|
//! | Pool | [`DocumentPool`] | Dense handles by frequency, position records |
//! | Score | [`borda::weighted_borda`] | `Σ conf[r] · (len − pos)` per document |
//! | Measure | [`distance::disagreement`] | KT or discounted KT per ranker |
//! | Update | [`ConfidenceVector`] | `exp(−d)` (query) or `1/d` (corpus), normalised |
//!
//! # Modes
//!
//! | Function | Confidence | Stops when |
//! |----------|------------|------------|
//! | [`aggregate_query`] | Per query | Order unchanged, or `max_iters` |
//! | [`aggregate_queries`] | Per query, batched | Each query independently |
//! | [`aggregate_corpus`] | Shared across queries | Exactly `max_iters` |
//!
//! [`select_configuration`] turns either mode into a ranking of candidate
//! configurations (see [`ParamGrid`] for building candidates).
//!
//! # Features
//!
//! - `parallel` (default): per-query work runs on the `rayon` pool. Output is
//!   identical to the sequential path.

use thiserror::Error;

pub mod aggregate;
pub mod borda;
pub mod confidence;
pub mod config;
pub mod corpus;
pub mod distance;
pub mod params;
pub mod pool;
pub mod select;
/// Validation utilities for aggregation results.
pub mod validate;

#[cfg(test)]
mod proptests;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// Unrecognised distance metric identifier.
    #[error("unknown distance metric: {0:?} (expected \"KT\" or \"dKT\")")]
    UnknownMetric(String),
    /// Unrecognised aggregation level.
    #[error("unknown aggregation level: {0:?} (expected \"query\" or \"corpus\")")]
    UnknownLevel(String),
    /// Invalid configuration value or document.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Candidate configuration field that does not exist.
    #[error("unknown parameter: {0:?}")]
    UnknownParameter(String),
    /// Candidate configuration field with an unusable value.
    #[error("invalid parameter {name:?}: {reason}")]
    InvalidParameter {
        /// Field (or raw pair) that failed.
        name: String,
        /// What was wrong.
        reason: String,
    },
    /// A ranking lists the same document twice.
    #[error("ranker {ranker} repeats a document at position {position}")]
    DuplicateDocument {
        /// Offending ranking.
        ranker: usize,
        /// Position of the repeat.
        position: usize,
    },
    /// Queries disagree on how many rankers there are.
    #[error("query {query} has {found} rankings, expected {expected}")]
    RankerCountMismatch {
        /// Offending query.
        query: usize,
        /// Ranker count of the first query.
        expected: usize,
        /// Ranker count of this query.
        found: usize,
    },
    /// A per-query failure inside a corpus run.
    #[error("query {query}: {source}")]
    Query {
        /// Query index.
        query: usize,
        /// Underlying error.
        #[source]
        source: Box<AggregationError>,
    },
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregationError>;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use aggregate::{aggregate_queries, aggregate_query, IterationStats, QueryAggregation};
pub use confidence::{ConfidenceVector, DISTANCE_FLOOR};
pub use config::{AggregationConfig, DEFAULT_MAX_ITERS};
pub use corpus::{aggregate_corpus, CorpusAggregation, CorpusState};
pub use distance::DistanceMetric;
pub use params::{ParamGrid, ScoringParams};
pub use pool::{DocumentPool, Position};
pub use select::{select_configuration, AggregationLevel, Selection};
pub use validate::{
    validate, validate_confidence, validate_consensus, validate_no_duplicates, ValidationResult,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Prelude for common imports.
///
/// ```rust
/// use concord::prelude::*;
///
/// let config = AggregationConfig::default().with_metric(DistanceMetric::DiscountedKendallTau);
/// assert!(config.validate().is_ok());
/// ```
pub mod prelude {
    pub use crate::{aggregate_corpus, aggregate_queries, aggregate_query, select_configuration};
    pub use crate::{
        AggregationConfig, AggregationError, AggregationLevel, ConfidenceVector,
        CorpusAggregation, DistanceMetric, ParamGrid, QueryAggregation, Result, ScoringParams,
        Selection,
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-query fan-out
// ─────────────────────────────────────────────────────────────────────────────

/// Apply `f` to every item, preserving input order.
#[cfg(feature = "parallel")]
pub(crate) fn map_queries<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    use rayon::prelude::*;

    items.par_iter().map(f).collect()
}

/// Apply `f` to every item, preserving input order.
#[cfg(not(feature = "parallel"))]
pub(crate) fn map_queries<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.iter().map(f).collect()
}
