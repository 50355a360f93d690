//! Property-based tests: key views read back exactly what `emit_array` wrote.

use proptest::prelude::*;

use mapview::key;
use mapview::prelude::*;

const VIEW: &str = "app/by_user";

/// Documents for one user: each has an optional `score` list and a `noise` field.
fn arb_documents() -> impl Strategy<Value = Vec<(Vec<i32>, i32)>> {
    prop::collection::vec(
        (
            prop::collection::vec(-1000i32..1000, 0..5),
            -1000i32..1000,
        ),
        0..8,
    )
}

fn index(docs: &[(Vec<i32>, i32)]) -> MockViewSource {
    let mut db = MockViewSource::new();
    for (scores, noise) in docs {
        db.index(
            VIEW,
            &EmitArray::new(key!["u1"])
                .field("score", scores.clone())
                .field("noise", *noise),
        );
        // Another user's rows never leak into u1's reads.
        db.index(VIEW, &EmitArray::new(key!["u2"]).field("score", 1_000_000));
    }
    db
}

proptest! {
    #[test]
    fn stats_reads_match_emitted_values(docs in arb_documents()) {
        let db = index(&docs);
        let opts = QueryOptions::new().couch_view(VIEW).source(&db);
        let scores: Vec<i64> = docs
            .iter()
            .flat_map(|(s, _)| s.iter().map(|&x| i64::from(x)))
            .collect();

        let sum = KeyView::new("score").get_value(&key!["u1"], &opts).unwrap();
        let count = KeyView::new("score")
            .reducer(StatsReduction::Count)
            .get_value(&key!["u1"], &opts)
            .unwrap();

        if scores.is_empty() {
            prop_assert_eq!(sum, Value::from(NO_VALUE));
            prop_assert_eq!(count, Value::from(NO_VALUE));
        } else {
            prop_assert_eq!(sum, Value::from(scores.iter().sum::<i64>()));
            prop_assert_eq!(count, Value::from(scores.len() as u64));
        }
    }

    #[test]
    fn unique_count_matches_distinct_values(docs in arb_documents()) {
        let db = index(&docs);
        let opts = QueryOptions::new().couch_view(VIEW).source(&db);
        let mut noise: Vec<i32> = docs.iter().map(|(_, n)| *n).collect();
        noise.sort_unstable();
        noise.dedup();

        let unique = KeyView::new("noise")
            .reducer(Reducer::unique_count())
            .get_value(&key!["u1"], &opts)
            .unwrap();
        prop_assert_eq!(unique, Value::from(noise.len() as u64));
    }
}
