//! Merge Determinism Tests
//!
//! Invariants for the multi-query merger:
//! - Merged output is a sorted permutation of the union of the inputs
//! - No entity key appears twice, whatever the stream overlap
//! - Output is identical for any concurrency ceiling
//! - List extremum extraction happens once per (entity, column) pair

use multiq::errors::{QueryError, QueryResult};
use multiq::merge::{MergeConfig, MultiQueryMerger, QuerySource};
use multiq::model::{Entity, Key, KeyId, Value};
use multiq::query::{OrderingSpec, RunOptions, SortSpec};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

struct StaticQuery {
    entities: Vec<Entity>,
}

impl QuerySource for StaticQuery {
    fn run(&self, _options: &RunOptions) -> QueryResult<Vec<Entity>> {
        Ok(self.entities.clone())
    }
}

struct FailingQuery;

impl QuerySource for FailingQuery {
    fn run(&self, _options: &RunOptions) -> QueryResult<Vec<Entity>> {
        Err(QueryError::subquery_failed("stream lost"))
    }
}

fn book(id: i64, pages: i64) -> Entity {
    Entity::from_json(Key::with_id("book", id), &json!({ "pages": pages }))
}

fn id_of(entity: &Entity) -> i64 {
    match entity.key().id() {
        KeyId::Id(id) => *id,
        KeyId::Name(_) => unreachable!("tests only use numeric ids"),
    }
}

fn pages_asc() -> OrderingSpec {
    OrderingSpec::new(vec![SortSpec::asc("pages")])
}

fn merged_ids(streams: Vec<Vec<Entity>>, ordering: OrderingSpec, workers: usize) -> Vec<i64> {
    let queries: Vec<StaticQuery> = streams
        .into_iter()
        .map(|entities| StaticQuery { entities })
        .collect();
    MultiQueryMerger::new(queries, ordering)
        .with_config(MergeConfig::with_workers(workers))
        .run(&RunOptions::default())
        .expect("merge should succeed")
        .map(|entity| id_of(&entity))
        .collect()
}

// =============================================================================
// Totality and Order
// =============================================================================

/// Merged output is sorted and covers every input entity exactly once.
#[test]
fn test_merge_is_sorted_permutation_of_union() {
    let streams = vec![
        vec![book(1, 10), book(4, 40), book(7, 70)],
        vec![book(2, 20), book(5, 50)],
        vec![book(3, 30), book(6, 60), book(8, 80), book(9, 90)],
    ];

    let ids = merged_ids(streams, pages_asc(), 2);
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

/// Output is byte-identical for ceilings 1, 2 and 8.
#[test]
fn test_concurrency_ceiling_never_changes_output() {
    let make_streams = || {
        vec![
            vec![book(3, 30), book(6, 60)],
            vec![book(1, 10), book(5, 50)],
            vec![book(2, 20), book(4, 40)],
            vec![book(7, 70)],
        ]
    };

    let reference = merged_ids(make_streams(), pages_asc(), 1);
    for workers in [2, 8] {
        assert_eq!(merged_ids(make_streams(), pages_asc(), workers), reference);
    }
    assert_eq!(reference, vec![1, 2, 3, 4, 5, 6, 7]);
}

/// Descending orderings merge descending streams correctly.
#[test]
fn test_descending_merge_order() {
    let ordering = OrderingSpec::new(vec![SortSpec::desc("pages")]);
    let streams = vec![
        vec![book(6, 60), book(4, 40), book(2, 20)],
        vec![book(5, 50), book(3, 30), book(1, 10)],
    ];

    assert_eq!(merged_ids(streams, ordering, 2), vec![6, 5, 4, 3, 2, 1]);
}

/// Entities of equal rank come out in ascending key order.
#[test]
fn test_equal_rank_resolves_by_key() {
    let streams = vec![
        vec![book(30, 10), book(10, 20)],
        vec![book(20, 10), book(40, 20)],
    ];

    assert_eq!(merged_ids(streams, pages_asc(), 2), vec![20, 30, 10, 40]);
}

// =============================================================================
// Deduplication
// =============================================================================

/// A key returned by several streams is emitted exactly once.
#[test]
fn test_overlapping_streams_deduplicate_by_key() {
    let streams = vec![
        vec![book(1, 10), book(2, 20), book(3, 30)],
        vec![book(2, 20), book(3, 30), book(4, 40)],
        vec![book(3, 30), book(5, 50)],
    ];

    let ids = merged_ids(streams, pages_asc(), 2);
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

/// Dropped duplicates are counted but never yielded.
#[test]
fn test_duplicate_counter() {
    let queries = vec![
        StaticQuery {
            entities: vec![book(1, 10)],
        },
        StaticQuery {
            entities: vec![book(1, 10)],
        },
        StaticQuery {
            entities: vec![book(1, 10)],
        },
    ];

    let merger = MultiQueryMerger::new(queries, pages_asc());
    let mut run = merger.run(&RunOptions::default()).unwrap();

    let emitted: Vec<Entity> = run.by_ref().collect();
    assert_eq!(emitted.len(), 1);
    assert_eq!(run.stats().duplicates_dropped, 2);
}

// =============================================================================
// List Extremum Memoization
// =============================================================================

/// With two fully interleaved streams of list-valued entities, every
/// entity's extremum is extracted exactly once even though each entity is
/// compared several times.
#[test]
fn test_extremum_extracted_once_per_entity_column() {
    let ranked = |id: i64, ranks: Vec<i64>| {
        Entity::new(Key::with_id("book", id)).with_property(
            "rank",
            Value::List(ranks.into_iter().map(Value::Integer).collect()),
        )
    };

    // Ascending order compares the maximum element of each list
    let queries = vec![
        StaticQuery {
            entities: vec![ranked(1, vec![1, 10]), ranked(3, vec![2, 30]), ranked(5, vec![3, 50])],
        },
        StaticQuery {
            entities: vec![ranked(2, vec![1, 20]), ranked(4, vec![2, 40]), ranked(6, vec![3, 60])],
        },
    ];

    let merger = MultiQueryMerger::new(queries, OrderingSpec::new(vec![SortSpec::asc("rank")]));
    let mut run = merger.run(&RunOptions::default()).unwrap();

    let ids: Vec<i64> = run.by_ref().map(|entity| id_of(&entity)).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

    // Six entities with one list column each: six extractions, not one per
    // comparison
    assert_eq!(run.comparator_stats().extremum_computations, 6);
}

// =============================================================================
// Failure Semantics
// =============================================================================

/// One failing stream fails the whole merge; no partial output survives.
#[test]
fn test_single_stream_failure_fails_merge() {
    enum Mixed {
        Ok(StaticQuery),
        Bad(FailingQuery),
    }

    impl QuerySource for Mixed {
        fn run(&self, options: &RunOptions) -> QueryResult<Vec<Entity>> {
            match self {
                Mixed::Ok(query) => query.run(options),
                Mixed::Bad(query) => query.run(options),
            }
        }
    }

    let make_queries = || {
        vec![
            Mixed::Ok(StaticQuery {
                entities: vec![book(1, 10), book(2, 20)],
            }),
            Mixed::Bad(FailingQuery),
            Mixed::Ok(StaticQuery {
                entities: vec![book(3, 30)],
            }),
        ]
    };

    for workers in [1, 2, 8] {
        let merger = MultiQueryMerger::new(make_queries(), pages_asc())
            .with_config(MergeConfig::with_workers(workers));
        let err = merger.run(&RunOptions::default()).unwrap_err();
        assert_eq!(err.code().code(), "MULTIQ_SUBQUERY_FAILED");
    }
}
