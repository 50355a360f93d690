//! Aggregate views read back rows written with `emit_array`.

use std::sync::Arc;

use mapview::prelude::*;
use mapview::{key, Error};

const VIEW: &str = "app/by_user";

fn database() -> MockViewSource {
    let mut db = MockViewSource::new().with_view("app/sums", MockReduce::Sum);
    let docs = [
        EmitArray::new(key!["u1"])
            .field("foo", 1)
            .field("bar", 0)
            .field("baz", 5)
            .field("bongo", 5)
            .field("spam", vec![1, 1, 2])
            .field("snork", 3)
            .extra_key("bar", "2024-01-10"),
        EmitArray::new(key!["u1"])
            .field("foo", 2)
            .field("bar", 1)
            .field("baz", 3)
            .field("bongo", 9)
            .field("spam", 6)
            .field("snork", FieldValue::Null)
            .extra_key("bar", "2024-03-01"),
        EmitArray::new(key!["u2"])
            .field("foo", 10)
            .field("bar", true)
            .extra_key("bar", "2024-02-01"),
    ];
    for doc in &docs {
        db.index(VIEW, doc);
        db.index("app/sums", doc);
    }
    db
}

fn simple_view() -> AggregateView {
    AggregateView::builder()
        .view("foo", KeyView::new("foo").reducer(StatsReduction::Sum))
        .view("bar", KeyView::new("bar").reducer(StatsReduction::Count))
        .view("baz", KeyView::new("baz").reducer(StatsReduction::Min))
        .view("bongo", KeyView::new("bongo").reducer(StatsReduction::Max))
        .view("spam1", KeyView::new("spam").reducer(StatsReduction::Mean { ndigits: 0 }))
        .view("spam2", KeyView::new("spam").reducer(StatsReduction::Mean { ndigits: 1 }))
        .view("snork", KeyView::new("snork").reducer(StatsReduction::SumSqr))
        .build()
}

#[test]
fn simple_aggregate_view() {
    let db = database();
    let opts = QueryOptions::new().couch_view(VIEW).source(&db);

    let row = simple_view().get_result(&key!["u1"], &opts).unwrap();
    assert_eq!(row["foo"], Value::from(3));
    assert_eq!(row["bar"], Value::from(2));
    assert_eq!(row["baz"], Value::from(3));
    assert_eq!(row["bongo"], Value::from(9));
    assert_eq!(row["spam1"], Value::from(3));
    assert_eq!(row["spam2"], Value::from(2.5));
    assert_eq!(row["snork"], Value::from(9));
}

#[test]
fn missing_fields_report_no_value() {
    let db = database();
    let opts = QueryOptions::new().couch_view(VIEW).source(&db);

    let row = simple_view().get_result(&key!["u2"], &opts).unwrap();
    assert_eq!(row["foo"], Value::from(10));
    assert_eq!(row["bar"], Value::from(1));
    for name in ["baz", "bongo", "spam1", "spam2", "snork"] {
        assert_eq!(row[name], Value::from(NO_VALUE), "{name}");
    }
}

#[test]
fn empty_results_view() {
    let db = database();
    let opts = QueryOptions::new().couch_view(VIEW).source(&db);

    let view = AggregateView::builder()
        .view("asdf1", KeyView::new("asdf").no_value("no value"))
        .view("asdf2", KeyView::new("asdf").reducer(StatsReduction::Count))
        .view("asdf3", KeyView::new("asdf").reducer(StatsReduction::Min))
        .view("asdf4", KeyView::new("asdf").reducer(StatsReduction::Max))
        .view("asdf5", KeyView::new("asdf").reducer(StatsReduction::Mean { ndigits: 0 }))
        .view("asdf6", KeyView::new("asdf").reducer(StatsReduction::SumSqr))
        .build();

    let row = view.get_result(&key!["u1"], &opts).unwrap();
    assert_eq!(row["asdf1"], Value::from("no value"));
    for name in ["asdf2", "asdf3", "asdf4", "asdf5", "asdf6"] {
        assert_eq!(row[name], Value::from(NO_VALUE), "{name}");
    }
}

#[test]
fn one_key_view_under_two_names() {
    let db = database();
    let opts = QueryOptions::new().couch_view(VIEW).source(&db);

    let foo: Arc<dyn ViewValue> = Arc::new(KeyView::new("foo"));
    let view = AggregateView::builder()
        .shared("foo", foo.clone())
        .shared("bar", foo)
        .build();

    let row = view.get_result(&key!["u1"], &opts).unwrap();
    assert_eq!(row["foo"], Value::from(3));
    assert_eq!(row["bar"], Value::from(3));
}

#[test]
fn date_suffix_restricts_one_field() {
    let db = database();
    let cutoff = key!["2024-02-01"];
    let bar = KeyView::new("bar").reducer(StatsReduction::Count);

    let before = QueryOptions::new()
        .couch_view(VIEW)
        .source(&db)
        .endkey(&cutoff);
    assert_eq!(bar.get_value(&key!["u1"], &before).unwrap(), Value::from(1));

    let after = QueryOptions::new()
        .couch_view(VIEW)
        .source(&db)
        .startkey(&cutoff);
    assert_eq!(bar.get_value(&key!["u1"], &after).unwrap(), Value::from(1));

    // Fields without a date suffix are unaffected by a shared end key.
    let foo = KeyView::new("foo").endkey_fn(|k| k);
    assert_eq!(foo.get_value(&key!["u1"], &before).unwrap(), Value::from(3));
}

#[test]
fn application_side_reducers() {
    let db = database();
    let opts = QueryOptions::new().couch_view(VIEW).source(&db);

    let unique = KeyView::new("spam").reducer(Reducer::unique_count());
    assert_eq!(unique.get_value(&key!["u1"], &opts).unwrap(), Value::from(3));

    let fifth_smallest = KeyView::new("spam").reducer(Reducer::map(|values| {
        let mut sorted: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
        sorted.sort_by(f64::total_cmp);
        sorted.get(4).copied().map(Value::from)
    }));
    assert_eq!(
        fifth_smallest.get_value(&key!["u1"], &opts).unwrap(),
        Value::from(NO_VALUE)
    );
}

#[test]
fn key_view_pins_its_own_source_and_view() {
    let pinned: Arc<dyn ViewSource> = Arc::new(database());
    let foo = KeyView::new("foo").couch_view("app/sums").source(pinned);

    // The fallback source knows no views at all.
    let empty = MockViewSource::new();
    let opts = QueryOptions::new().couch_view("unused").source(&empty);
    assert_eq!(foo.get_value(&key!["u1"], &opts).unwrap(), Value::from(3));
}

#[test]
fn sum_views_cannot_answer_stats_reductions() {
    let db = database();
    let opts = QueryOptions::new().couch_view("app/sums").source(&db);

    assert_eq!(
        KeyView::new("foo").get_value(&key!["u1"], &opts).unwrap(),
        Value::from(3)
    );
    let err = KeyView::new("foo")
        .reducer(StatsReduction::Mean { ndigits: 0 })
        .get_value(&key!["u1"], &opts)
        .unwrap_err();
    assert!(matches!(err, Error::Reduce(mapview_core::Error::NotStats)));
}

#[test]
fn rows_for_several_users() {
    let db = database();
    let opts = QueryOptions::new().couch_view(VIEW).source(&db);

    let view = AggregateView::builder()
        .view("foo", KeyView::new("foo"))
        .view(
            "foo_share",
            AggregateKeyView::percent(KeyView::new("foo"), KeyView::unkeyed()),
        )
        .build();

    let rows = view.rows(&[key!["u1"], key!["u2"]], &opts).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["foo"], Value::from(3));
    assert_eq!(rows[1]["foo"], Value::from(10));
    // u2 has foo = 10 and bar = true, emitted as 1
    let share = rows[1]["foo_share"].as_f64().unwrap();
    assert!((share - 1000.0 / 11.0).abs() < 1e-9);
}
