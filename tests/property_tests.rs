use concord::{
    aggregate_corpus, aggregate_queries, aggregate_query, select_configuration, AggregationConfig,
    AggregationLevel, DistanceMetric,
};
use proptest::prelude::*;

fn ranking() -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence((0..25).map(|i| format!("d{i}")).collect::<Vec<_>>(), 1..=10)
        .prop_shuffle()
}

/// 1 to 3 queries, each with `rankers` rankings.
fn corpus(rankers: usize) -> impl Strategy<Value = Vec<Vec<Vec<String>>>> {
    prop::collection::vec(prop::collection::vec(ranking(), rankers), 1..4)
}

proptest! {
    #[test]
    fn prop_identical_rankers_share_confidence(r in ranking(), p in 1usize..6) {
        let rankings = vec![r.clone(); p];
        let result = aggregate_query(&rankings, &AggregationConfig::default()).unwrap();

        prop_assert_eq!(result.ranking, r);
        prop_assert!(result.converged);
        for w in result.confidence.as_slice() {
            prop_assert!((w - 1.0 / p as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn prop_ranker_order_permutes_confidence(
        rs in prop::collection::vec(ranking(), 2..5),
    ) {
        // One round: weights depend only on each ranker's distance to the
        // consensus, so reversing the rankers reverses the weights whenever
        // both runs reach the same consensus.
        let config = AggregationConfig::default().with_max_iters(1);
        let forward = aggregate_query(&rs, &config).unwrap();
        let mut reversed_input = rs.clone();
        reversed_input.reverse();
        let reversed = aggregate_query(&reversed_input, &config).unwrap();

        let mut a = forward.ranking.clone();
        let mut b = reversed.ranking.clone();
        a.sort();
        b.sort();
        prop_assert_eq!(a, b);
        prop_assert_eq!(forward.confidence.len(), reversed.confidence.len());

        if forward.ranking == reversed.ranking {
            let flipped = forward.confidence.as_slice().iter().rev();
            for (w, v) in flipped.zip(reversed.confidence.as_slice()) {
                prop_assert!((w - v).abs() < 1e-12, "{} vs {}", w, v);
            }
        }
    }

    #[test]
    fn prop_reversed_ranker_is_least_trusted(r in ranking(), copies in 2usize..5) {
        prop_assume!(r.len() >= 2);
        let mut rankings = vec![r.clone(); copies];
        let mut reversed = r.clone();
        reversed.reverse();
        rankings.push(reversed);

        for metric in [DistanceMetric::KendallTau, DistanceMetric::DiscountedKendallTau] {
            let config = AggregationConfig::default().with_metric(metric);
            let result = aggregate_query(&rankings, &config).unwrap();
            let last = result.confidence[copies];
            prop_assert!(result.confidence.as_slice()[..copies].iter().all(|&w| w > last));
        }
    }

    #[test]
    fn prop_batch_matches_single(qs in corpus(3)) {
        let config = AggregationConfig::default();
        let batch = aggregate_queries(&qs, &config);
        for (q, result) in qs.iter().zip(batch) {
            prop_assert_eq!(result.unwrap(), aggregate_query(q, &config).unwrap());
        }
    }

    #[test]
    fn prop_corpus_is_deterministic(qs in corpus(3)) {
        let config = AggregationConfig::default().with_max_iters(3);
        let a = aggregate_corpus(&qs, &config).unwrap();
        let b = aggregate_corpus(&qs, &config).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_selection_ranks_every_candidate(
        qs in prop::collection::vec(prop::collection::vec(ranking(), 4), 1..4),
        corpus in any::<bool>(),
    ) {
        let level = if corpus { AggregationLevel::Corpus } else { AggregationLevel::Query };
        let selection = select_configuration(&qs, level, &AggregationConfig::default()).unwrap();

        let mut ranked = selection.ranked.clone();
        ranked.sort_unstable();
        prop_assert_eq!(ranked, vec![0, 1, 2, 3]);
        prop_assert!(selection
            .ranked
            .windows(2)
            .all(|w| selection.scores[w[0]] >= selection.scores[w[1]]));
    }
}
