//! Post-hoc checks on aggregation output.
//!
//! These never fail a run; they report what looks wrong so callers can log or
//! assert on it.

use std::collections::HashSet;
use std::hash::Hash;

use crate::aggregate::QueryAggregation;

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// False if any error was recorded.
    pub is_valid: bool,
    /// Violated invariants.
    pub errors: Vec<String>,
    /// Suspicious but legal observations.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Valid, with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn error(&mut self, msg: String) {
        self.is_valid = false;
        self.errors.push(msg);
    }

    fn warning(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    /// Fold another result into this one.
    pub fn merge(&mut self, other: Self) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Check a confidence vector: finite, non-negative, summing to 1 within `tolerance`.
///
/// A zero weight is reported as a warning: that ranker no longer influences
/// the consensus.
///
/// # Example
///
/// ```rust
/// use concord::validate_confidence;
///
/// assert!(validate_confidence(&[0.5, 0.25, 0.25], 1e-9).is_valid);
/// assert!(!validate_confidence(&[0.5, 0.6], 1e-9).is_valid);
/// ```
#[must_use]
pub fn validate_confidence(weights: &[f64], tolerance: f64) -> ValidationResult {
    let mut result = ValidationResult::new();
    if weights.is_empty() {
        return result;
    }

    for (ranker, &w) in weights.iter().enumerate() {
        if !w.is_finite() {
            result.error(format!("ranker {ranker}: non-finite weight {w}"));
        } else if w < 0.0 {
            result.error(format!("ranker {ranker}: negative weight {w}"));
        } else if w == 0.0 {
            result.warning(format!("ranker {ranker}: zero weight"));
        }
    }

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > tolerance {
        result.error(format!("weights sum to {sum}, expected 1"));
    }
    result
}

/// Check that `ranking` lists no document twice.
#[must_use]
pub fn validate_no_duplicates<I: Eq + Hash + std::fmt::Debug>(ranking: &[I]) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut seen = HashSet::with_capacity(ranking.len());
    for (position, id) in ranking.iter().enumerate() {
        if !seen.insert(id) {
            result.error(format!("duplicate document {id:?} at position {position}"));
        }
    }
    result
}

/// Check that `consensus` is a permutation of every document in `rankings`.
///
/// # Example
///
/// ```rust
/// use concord::validate_consensus;
///
/// let rankings = vec![vec!["a", "b"], vec!["c"]];
/// assert!(validate_consensus(&rankings, &["c", "a", "b"]).is_valid);
/// assert!(!validate_consensus(&rankings, &["a", "b"]).is_valid);
/// ```
#[must_use]
pub fn validate_consensus<I, L>(rankings: &[L], consensus: &[I]) -> ValidationResult
where
    I: Eq + Hash + std::fmt::Debug,
    L: AsRef<[I]>,
{
    let mut result = validate_no_duplicates(consensus);

    let pool: HashSet<&I> = rankings.iter().flat_map(|r| r.as_ref()).collect();
    let listed: HashSet<&I> = consensus.iter().collect();

    for id in consensus {
        if !pool.contains(id) {
            result.error(format!("document {id:?} is not in any ranking"));
        }
    }
    let missing = pool.difference(&listed).count();
    // First missing id in input order, so the message is stable.
    if let Some(id) = rankings
        .iter()
        .flat_map(|r| r.as_ref())
        .find(|id| !listed.contains(id))
    {
        result.error(format!("{missing} document(s) missing from consensus, first {id:?}"));
    }
    result
}

/// Validate a query-level result against the rankings that produced it.
///
/// Also warns when the iteration cap was hit.
#[must_use]
pub fn validate<I, L>(
    rankings: &[L],
    aggregation: &QueryAggregation<I>,
    tolerance: f64,
) -> ValidationResult
where
    I: Eq + Hash + std::fmt::Debug,
    L: AsRef<[I]>,
{
    let mut result = validate_confidence(aggregation.confidence.as_slice(), tolerance);
    result.merge(validate_consensus(rankings, &aggregation.ranking));

    if aggregation.confidence.len() != rankings.len() {
        result.error(format!(
            "{} weights for {} rankers",
            aggregation.confidence.len(),
            rankings.len()
        ));
    }
    if !aggregation.converged {
        result.warning(format!(
            "not converged after {} iterations",
            aggregation.iterations
        ));
    }
    result
}
