//! Unsupervised model selection: pick candidate configurations by how well
//! their rankings agree with the consensus, without relevance judgments.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::aggregate_queries;
use crate::config::AggregationConfig;
use crate::corpus::aggregate_corpus;
use crate::{AggregationError, Result};

/// Where confidence is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationLevel {
    /// Per query, exponential-decay weights; summed across queries.
    #[default]
    Query,
    /// One shared inverse-distance vector for the whole corpus.
    Corpus,
}

impl fmt::Display for AggregationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Corpus => "corpus",
        })
    }
}

impl FromStr for AggregationLevel {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "query" => Ok(Self::Query),
            "corpus" => Ok(Self::Corpus),
            other => Err(AggregationError::UnknownLevel(other.to_string())),
        }
    }
}

/// Candidate scores from [`select_configuration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Score per candidate (ranker index).
    ///
    /// Query level: sum of per-query confidences. Corpus level: the shared
    /// confidence vector.
    pub scores: Vec<f64>,
    /// Candidate indices, best first; ties by ascending index.
    pub ranked: Vec<usize>,
    /// Queries that failed and were left out (query level only).
    pub skipped_queries: Vec<usize>,
}

impl Selection {
    fn from_scores(scores: Vec<f64>, skipped_queries: Vec<usize>) -> Self {
        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        Self {
            scores,
            ranked,
            skipped_queries,
        }
    }

    /// Best candidate index.
    #[must_use]
    pub fn best(&self) -> Option<usize> {
        self.ranked.first().copied()
    }

    /// Up to `n` candidate indices, best first.
    #[must_use]
    pub fn top(&self, n: usize) -> &[usize] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// Pair the top `n` candidates with their scores.
    ///
    /// `candidates` is indexed like the rankers (e.g. the output of
    /// [`crate::ParamGrid::expand`]). Indices past its end are skipped.
    pub fn top_candidates<'a, T>(&self, candidates: &'a [T], n: usize) -> Vec<(&'a T, f64)> {
        self.top(n)
            .iter()
            .filter_map(|&i| candidates.get(i).map(|c| (c, self.scores[i])))
            .collect()
    }
}

/// Score candidate configurations across a query set.
///
/// `queries[q][r]` is candidate `r`'s ranking for query `q`.
///
/// # Errors
///
/// Corpus level: any error from [`aggregate_corpus`]. Query level: only if
/// every query fails (or queries disagree on the candidate count); individual
/// failures are logged and listed in [`Selection::skipped_queries`].
///
/// # Example
///
/// ```rust
/// use concord::{select_configuration, AggregationConfig, AggregationLevel};
///
/// let queries = vec![
///     vec![vec!["a", "b", "c"], vec!["c", "b", "a"], vec!["a", "b", "c"]],
///     vec![vec!["x", "y", "z"], vec!["z", "y", "x"], vec!["x", "z", "y"]],
/// ];
/// let selection =
///     select_configuration(&queries, AggregationLevel::Query, &AggregationConfig::default())
///         .unwrap();
///
/// // Candidate 1 reverses the consensus on the first query.
/// assert_eq!(selection.ranked.last(), Some(&1));
/// assert_eq!(selection.top(2).len(), 2);
/// ```
pub fn select_configuration<I, L, Q>(
    queries: &[Q],
    level: AggregationLevel,
    config: &AggregationConfig,
) -> Result<Selection>
where
    I: Clone + Eq + Hash + Send + Sync,
    L: AsRef<[I]>,
    Q: AsRef<[L]> + Sync,
{
    let selection = match level {
        AggregationLevel::Corpus => {
            let corpus = aggregate_corpus(queries, config)?;
            Selection::from_scores(corpus.confidence.into_inner(), Vec::new())
        }
        AggregationLevel::Query => {
            config.validate()?;
            let rankers = queries.first().map_or(0, |q| q.as_ref().len());
            let mut scores = vec![0.0; rankers];
            let mut skipped = Vec::new();
            let mut first_error = None;

            for (query, result) in aggregate_queries(queries, config).into_iter().enumerate() {
                let found = queries[query].as_ref().len();
                let result = if found == rankers {
                    result
                } else {
                    Err(AggregationError::RankerCountMismatch {
                        query,
                        expected: rankers,
                        found,
                    })
                };
                match result {
                    Ok(aggregation) => {
                        for (total, w) in scores.iter_mut().zip(aggregation.confidence.as_slice()) {
                            *total += w;
                        }
                    }
                    Err(error) => {
                        warn!(query, %error, "skipping query");
                        skipped.push(query);
                        first_error.get_or_insert(error);
                    }
                }
            }

            if !queries.is_empty() && skipped.len() == queries.len() {
                if let Some(error) = first_error {
                    return Err(error);
                }
            }
            Selection::from_scores(scores, skipped)
        }
    };

    info!(
        %level,
        candidates = selection.scores.len(),
        best = ?selection.best(),
        skipped = selection.skipped_queries.len(),
        "configuration selection complete"
    );
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamGrid, ScoringParams};

    fn queries() -> Vec<Vec<Vec<&'static str>>> {
        vec![
            vec![
                vec!["a", "b", "c", "d"],
                vec!["d", "c", "b", "a"],
                vec!["a", "b", "d", "c"],
            ],
            vec![
                vec!["w", "x", "y"],
                vec!["y", "x", "w"],
                vec!["w", "y", "x"],
            ],
        ]
    }

    #[test]
    fn level_parsing() {
        assert_eq!("query".parse::<AggregationLevel>().unwrap(), AggregationLevel::Query);
        assert_eq!("corpus".parse::<AggregationLevel>().unwrap(), AggregationLevel::Corpus);
        assert_eq!(
            "global".parse::<AggregationLevel>().unwrap_err(),
            AggregationError::UnknownLevel("global".into())
        );
        assert_eq!(AggregationLevel::Corpus.to_string(), "corpus");
    }

    #[test]
    fn query_level_sums_confidences() {
        let selection =
            select_configuration(&queries(), AggregationLevel::Query, &AggregationConfig::default())
                .unwrap();

        assert_eq!(selection.scores.len(), 3);
        let total: f64 = selection.scores.iter().sum();
        assert!((total - 2.0).abs() < 1e-9, "two queries, each sums to 1");
        assert_eq!(selection.ranked.last(), Some(&1));
        assert!(selection.skipped_queries.is_empty());
    }

    #[test]
    fn corpus_level_uses_shared_vector() {
        let config = AggregationConfig::default();
        let selection =
            select_configuration(&queries(), AggregationLevel::Corpus, &config).unwrap();

        let total: f64 = selection.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(selection.ranked.last(), Some(&1));
    }

    #[test]
    fn failed_query_is_skipped() {
        let mut qs = queries();
        qs.push(vec![vec!["p", "p"], vec!["p"], vec!["q"]]);
        let selection =
            select_configuration(&qs, AggregationLevel::Query, &AggregationConfig::default())
                .unwrap();

        assert_eq!(selection.skipped_queries, vec![2]);
        assert_eq!(selection.scores.len(), 3);
    }

    #[test]
    fn mismatched_query_is_skipped_at_query_level() {
        let mut qs = queries();
        qs.push(vec![vec!["p"]]);
        let selection =
            select_configuration(&qs, AggregationLevel::Query, &AggregationConfig::default())
                .unwrap();
        assert_eq!(selection.skipped_queries, vec![2]);

        let err = select_configuration(&qs, AggregationLevel::Corpus, &AggregationConfig::default())
            .unwrap_err();
        assert!(matches!(err, AggregationError::RankerCountMismatch { query: 2, .. }));
    }

    #[test]
    fn all_queries_failing_is_an_error() {
        let qs = vec![vec![vec!["a", "a"]]];
        assert!(
            select_configuration(&qs, AggregationLevel::Query, &AggregationConfig::default())
                .is_err()
        );
    }

    #[test]
    fn top_candidates_maps_back_to_params() {
        let candidates = ParamGrid::new()
            .axis("title", vec![5.0, 10.0, 15.0])
            .unwrap()
            .expand(&ScoringParams::default());
        let selection =
            select_configuration(&queries(), AggregationLevel::Query, &AggregationConfig::default())
                .unwrap();

        let top = selection.top_candidates(&candidates, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, &candidates[selection.ranked[0]]);
        assert!(top[0].1 >= top[1].1);
        assert_eq!(selection.top(10).len(), 3);
    }

    #[test]
    fn empty_query_set() {
        let qs: Vec<Vec<Vec<&str>>> = vec![];
        let selection =
            select_configuration(&qs, AggregationLevel::Query, &AggregationConfig::default())
                .unwrap();
        assert!(selection.scores.is_empty());
        assert_eq!(selection.best(), None);
    }
}
