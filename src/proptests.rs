//! Property-based tests for the aggregation core.

use proptest::prelude::*;

use crate::borda::{consensus_order, consensus_ranks, weighted_borda};
use crate::distance::{discount, disagreement, DistanceMetric};
use crate::{
    aggregate_corpus, aggregate_query, validate_confidence, validate_consensus,
    AggregationConfig, ConfidenceVector, DocumentPool,
};

/// A ranking of distinct ids drawn from a shared universe, so rankings overlap.
fn ranking() -> impl Strategy<Value = Vec<u32>> {
    prop::sample::subsequence((0..30u32).collect::<Vec<_>>(), 0..=12).prop_shuffle()
}

fn rankings() -> impl Strategy<Value = Vec<Vec<u32>>> {
    prop::collection::vec(ranking(), 1..6)
}

fn metric() -> impl Strategy<Value = DistanceMetric> {
    prop_oneof![
        Just(DistanceMetric::KendallTau),
        Just(DistanceMetric::DiscountedKendallTau)
    ]
}

fn config() -> impl Strategy<Value = AggregationConfig> {
    (1..15usize, metric(), any::<bool>())
        .prop_map(|(iters, m, absent)| AggregationConfig::new(iters, m).with_absent_penalty(absent))
}

/// Uncached discounted KT, pair by pair.
fn naive_distance(local: &[usize], ranks: &[usize], metric: DistanceMetric) -> f64 {
    let mut total = 0.0;
    for i in 0..local.len() {
        for j in i + 1..local.len() {
            let (hi, lo) = (ranks[local[i]], ranks[local[j]]);
            if hi > lo {
                total += match metric {
                    DistanceMetric::KendallTau => 1.0,
                    DistanceMetric::DiscountedKendallTau => discount(lo, hi),
                };
            }
        }
    }
    total
}

proptest! {
    #[test]
    fn consensus_is_permutation_of_pool(rs in rankings(), cfg in config()) {
        let result = aggregate_query(&rs, &cfg).unwrap();
        let report = validate_consensus(&rs, &result.ranking);
        prop_assert!(report.is_valid, "{:?}", report.errors);
    }

    #[test]
    fn query_confidence_is_normalised(rs in rankings(), cfg in config()) {
        let result = aggregate_query(&rs, &cfg).unwrap();
        prop_assert_eq!(result.confidence.len(), rs.len());
        let report = validate_confidence(result.confidence.as_slice(), 1e-9);
        prop_assert!(report.is_valid, "{:?}", report.errors);
    }

    #[test]
    fn query_terminates_within_cap(rs in rankings(), cfg in config()) {
        let result = aggregate_query(&rs, &cfg).unwrap();
        prop_assert!(result.iterations <= cfg.max_iters);
        if result.converged && !result.ranking.is_empty() {
            // The detecting round does not reweight.
            prop_assert_eq!(result.history.len() + 1, result.iterations);
        } else if !result.converged {
            prop_assert_eq!(result.iterations, cfg.max_iters);
        }
    }

    #[test]
    fn query_is_deterministic(rs in rankings(), cfg in config()) {
        let a = aggregate_query(&rs, &cfg).unwrap();
        let b = aggregate_query(&rs, &cfg).unwrap();
        prop_assert_eq!(&a.ranking, &b.ranking);
        let bits = |c: &ConfidenceVector| {
            c.as_slice().iter().map(|w| w.to_bits()).collect::<Vec<_>>()
        };
        prop_assert_eq!(bits(&a.confidence), bits(&b.confidence));
    }

    #[test]
    fn single_ranker_is_identity(r in ranking(), cfg in config()) {
        let result = aggregate_query(&[r.clone()], &cfg).unwrap();
        prop_assert_eq!(result.ranking, r);
    }

    #[test]
    fn corpus_confidence_is_normalised(
        queries in prop::collection::vec(prop::collection::vec(ranking(), 3), 1..5),
        cfg in config(),
    ) {
        let result = aggregate_corpus(&queries, &cfg).unwrap();
        prop_assert_eq!(result.iterations, cfg.max_iters);
        prop_assert_eq!(result.rankings.len(), queries.len());
        let report = validate_confidence(result.confidence.as_slice(), 1e-9);
        prop_assert!(report.is_valid, "{:?}", report.errors);
    }

    #[test]
    fn cached_distance_matches_naive(rs in rankings(), m in metric()) {
        let pool = DocumentPool::build(&rs).unwrap();
        let confidence = ConfidenceVector::uniform(pool.num_rankers());
        let ranks = consensus_ranks(&consensus_order(&weighted_borda(&pool, &confidence)));
        let d = disagreement(pool.rankings(), &ranks, m, false);

        for (local, &got) in pool.rankings().iter().zip(&d.distances) {
            let want = naive_distance(local, &ranks, m);
            prop_assert_eq!(got.to_bits(), want.to_bits(), "{} vs {}", got, want);
        }
    }

    #[test]
    fn absence_penalty_never_lowers_distance(rs in rankings(), m in metric()) {
        let pool = DocumentPool::build(&rs).unwrap();
        let confidence = ConfidenceVector::uniform(pool.num_rankers());
        let ranks = consensus_ranks(&consensus_order(&weighted_borda(&pool, &confidence)));
        let plain = disagreement(pool.rankings(), &ranks, m, false);
        let penalised = disagreement(pool.rankings(), &ranks, m, true);

        for (p, q) in plain.distances.iter().zip(&penalised.distances) {
            prop_assert!(q >= p);
        }
    }

    #[test]
    fn handles_follow_frequency(rs in rankings()) {
        let pool = DocumentPool::build(&rs).unwrap();
        let freq: Vec<usize> = (0..pool.len()).map(|h| pool.positions(h).len()).collect();
        prop_assert!(freq.windows(2).all(|w| w[0] >= w[1]));
    }
}
