//! Multi-query merger
//!
//! Runs N independent ordered sub-queries concurrently (bounded by
//! [`MergeConfig`](super::MergeConfig)) and merges their buffered result
//! streams into one globally ordered, key-deduplicated stream. The merged
//! output is fully determined by the ordering spec: the concurrency
//! ceiling and worker scheduling can never change it.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::errors::QueryResult;
use crate::model::{Entity, Key};
use crate::observability::Logger;
use crate::query::{OrderingSpec, RunOptions};

use super::comparator::{ComparatorStats, EntityComparator};
use super::config::MergeConfig;
use super::fanout;

/// One executable sub-query.
///
/// Implementations must be idempotent per logical execution; the merger
/// invokes `run` exactly once per sub-query.
pub trait QuerySource: Send + Sync {
    /// Produces this sub-query's ordered result stream.
    ///
    /// The pagination bounds are push-down hints; the merger applies no
    /// pagination of its own.
    fn run(&self, options: &RunOptions) -> QueryResult<Vec<Entity>>;
}

/// Passive counters for one merged run
#[derive(Debug, Default, Clone)]
pub struct MergeStats {
    /// Entities dropped because their key was already emitted by another
    /// stream (disjunctive key overlap)
    pub duplicates_dropped: u64,
}

/// Runs multiple sub-queries and merges the result sets based on the
/// shared ordering.
pub struct MultiQueryMerger<Q: QuerySource> {
    queries: Vec<Q>,
    ordering: OrderingSpec,
    config: MergeConfig,
}

impl<Q: QuerySource> MultiQueryMerger<Q> {
    /// Creates a merger over independent sub-queries sharing one ordering
    pub fn new(queries: Vec<Q>, ordering: OrderingSpec) -> Self {
        Self {
            queries,
            ordering,
            config: MergeConfig::default(),
        }
    }

    /// Overrides the merge tunables
    pub fn with_config(mut self, config: MergeConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of sub-queries in this merger
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Executes all sub-queries and returns the merged stream.
    ///
    /// Fan-out completes (join barrier) before the first element can be
    /// pulled; a single sub-query failure fails the whole run with no
    /// partial results.
    pub fn run(&self, options: &RunOptions) -> QueryResult<MergedRun> {
        let buffers = fanout::run_all(&self.queries, options, self.config.worker_count)?;

        let fetched: usize = buffers.iter().map(Vec::len).sum();
        Logger::trace(
            "MERGE_FANOUT_COMPLETE",
            &[
                ("queries", &self.queries.len().to_string()),
                ("workers", &self.config.worker_count.to_string()),
                ("rows", &fetched.to_string()),
            ],
        );

        Ok(MergedRun::new(buffers, self.ordering.clone()))
    }
}

/// Lazily merged, deduplicated stream over buffered sub-query results.
///
/// Selection is a linear scan over live stream heads; the dispatcher caps
/// a merge round at 30 sub-queries, so the scan stays small.
pub struct MergedRun {
    streams: Vec<std::vec::IntoIter<Entity>>,
    heads: Vec<Option<Entity>>,
    comparator: EntityComparator,
    seen_keys: HashSet<Key>,
    stats: MergeStats,
}

impl MergedRun {
    fn new(buffers: Vec<Vec<Entity>>, ordering: OrderingSpec) -> Self {
        let mut streams: Vec<std::vec::IntoIter<Entity>> =
            buffers.into_iter().map(Vec::into_iter).collect();
        let heads = streams.iter_mut().map(Iterator::next).collect();
        Self {
            streams,
            heads,
            comparator: EntityComparator::new(ordering),
            seen_keys: HashSet::new(),
            stats: MergeStats::default(),
        }
    }

    /// Returns the passive merge counters
    pub fn stats(&self) -> &MergeStats {
        &self.stats
    }

    /// Returns the comparator's passive counters
    pub fn comparator_stats(&self) -> &ComparatorStats {
        self.comparator.stats()
    }

    /// Picks the stream whose head ranks first, exhausted streams excluded
    fn select_winner(&mut self) -> Option<usize> {
        let Self {
            heads, comparator, ..
        } = self;

        let mut winner: Option<usize> = None;
        for (index, head) in heads.iter().enumerate() {
            let Some(candidate) = head else { continue };
            winner = match winner {
                None => Some(index),
                Some(current) => {
                    // Safe: winner only ever points at a present head
                    let best = heads[current].as_ref().unwrap_or(candidate);
                    if comparator.compare(candidate, best) == Ordering::Less {
                        Some(index)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        winner
    }
}

impl Iterator for MergedRun {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        loop {
            let index = self.select_winner()?;
            // Present by selection; advance the winning stream
            let entity = self.heads[index].take()?;
            self.heads[index] = self.streams[index].next();

            if self.seen_keys.insert(entity.key().clone()) {
                return Some(entity);
            }
            self.stats.duplicates_dropped += 1;
        }
    }
}
