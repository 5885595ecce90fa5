//! Bounded concurrent sub-query execution
//!
//! A fixed-size pool of scoped worker threads drains a shared work queue
//! (claim-next-index, no polling) and buffers each sub-query's results
//! into its own slot. All workers are joined before any result is used, so
//! completion order can never leak into output order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::errors::{QueryError, QueryResult};
use crate::model::Entity;
use crate::query::RunOptions;

use super::merger::QuerySource;

/// Runs every query with at most `worker_count` in flight and returns the
/// buffered result streams in query order.
///
/// Any sub-query failure fails the whole fan-out; when several fail, the
/// error of the lowest query index is returned so the outcome does not
/// depend on scheduling. Workers are always joined to completion first.
pub(crate) fn run_all<Q: QuerySource>(
    queries: &[Q],
    options: &RunOptions,
    worker_count: usize,
) -> QueryResult<Vec<Vec<Entity>>> {
    if queries.is_empty() {
        return Ok(Vec::new());
    }

    let worker_count = worker_count.max(1).min(queries.len());
    let next_index = AtomicUsize::new(0);
    let mut slots: Vec<Option<QueryResult<Vec<Entity>>>> = Vec::new();
    slots.resize_with(queries.len(), || None);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..worker_count)
            .map(|_| {
                let next_index = &next_index;
                scope.spawn(move || {
                    let mut produced = Vec::new();
                    loop {
                        let index = next_index.fetch_add(1, Ordering::SeqCst);
                        if index >= queries.len() {
                            break;
                        }
                        let result =
                            catch_unwind(AssertUnwindSafe(|| queries[index].run(options)))
                                .unwrap_or_else(|_| Err(QueryError::worker_panic(index)));
                        produced.push((index, result));
                    }
                    produced
                })
            })
            .collect();

        // Join barrier: every launched worker completes before the merge
        // may begin.
        for handle in handles {
            if let Ok(produced) = handle.join() {
                for (index, result) in produced {
                    slots[index] = Some(result);
                }
            }
        }
    });

    let mut buffers = Vec::with_capacity(slots.len());
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(entities)) => buffers.push(entities),
            Some(Err(error)) => return Err(error),
            // A worker died outside the guarded run call
            None => return Err(QueryError::worker_panic(index)),
        }
    }

    Ok(buffers)
}
