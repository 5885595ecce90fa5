//! Key-based query dispatch
//!
//! Does the most efficient fetching possible when the keys of the wanted
//! entities are already known. Strategy selection:
//!
//! 1. Projection requested: ancestor-rewritten multi-queries through the
//!    merger, never touching the result cache
//! 2. Single key with a cached entity: serve the cache copy, skip the
//!    datastore and skip repopulation
//! 3. Otherwise: one batched `get_multi` over every distinct key
//!
//! Whatever the strategy, results funnel through one final in-memory sort
//! and the shared [`QueryResults`] pass, so ordering and pagination are
//! uniform.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use crate::errors::{QueryError, QueryResult};
use crate::merge::{EntityComparator, MultiQueryMerger, QuerySource};
use crate::model::{Entity, Key};
use crate::observability::Logger;
use crate::query::{OrderingSpec, QueryOptions, RunOptions, SubQuery};

use super::connection::{CachingSituation, DatastoreConnection, ResultCache};
use super::null::NullQuery;
use super::results::QueryResults;

/// Hard cap on sub-queries per merge round.
///
/// Ancestor projection batches are chunked to this size before being
/// handed to the merger; the cap bounds the merger's head-scan cost and
/// the datastore's concurrent ancestor scans.
pub const MAX_MERGE_QUERIES: usize = 30;

/// Adapter running one rewritten sub-query through the connection
struct ConnectionQuery<'a, D: DatastoreConnection> {
    connection: &'a D,
    query: SubQuery,
}

impl<D: DatastoreConnection> QuerySource for ConnectionQuery<'_, D> {
    fn run(&self, options: &RunOptions) -> QueryResult<Vec<Entity>> {
        self.connection.run_query(&self.query, options)
    }
}

/// Executes a set of key-filtered sub-queries sharing one logical query.
///
/// Every sub-query must carry a `__key__ =` filter; several sub-queries
/// may name the same key (disjunctive filters OR-ed at the key level).
pub struct QueryByKeys<'a, D: DatastoreConnection, C: ResultCache> {
    connection: &'a D,
    cache: &'a C,
    kind: String,
    queries_by_key: BTreeMap<Key, Vec<SubQuery>>,
    options: QueryOptions,
    ordering: OrderingSpec,
    namespace: Option<String>,
}

impl<'a, D: DatastoreConnection, C: ResultCache> QueryByKeys<'a, D, C> {
    /// Groups the sub-queries by their key filter.
    ///
    /// Grouping is exhaustive and exact: a sub-query without a key filter
    /// is a construction error, and every sub-query lands in exactly one
    /// key group.
    pub fn new(
        connection: &'a D,
        cache: &'a C,
        kind: impl Into<String>,
        queries: Vec<SubQuery>,
        ordering: OrderingSpec,
        namespace: Option<String>,
    ) -> QueryResult<Self> {
        let first = queries
            .first()
            .ok_or_else(|| QueryError::invalid_query("at least one sub-query is required"))?;
        let options = first.options.clone();

        let mut queries_by_key: BTreeMap<Key, Vec<SubQuery>> = BTreeMap::new();
        for query in queries {
            let key = query
                .key_filter()
                .ok_or_else(|| {
                    QueryError::invalid_query(format!(
                        "sub-query on kind '{}' has no __key__ equality filter",
                        query.kind
                    ))
                })?
                .clone();
            queries_by_key.entry(key).or_default().push(query);
        }

        Ok(Self {
            connection,
            cache,
            kind: kind.into(),
            queries_by_key,
            options,
            ordering,
            namespace,
        })
    }

    /// Target entity kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of distinct keys requested
    pub fn key_count(&self) -> usize {
        self.queries_by_key.len()
    }

    /// Runs the query and lazily yields post-processed results.
    ///
    /// All candidate entities are fetched and sorted before the first item
    /// is yielded; limit and offset trim the yielded sequence, not the
    /// fetch itself.
    pub fn run(&self, limit: Option<usize>, offset: Option<usize>) -> QueryResult<QueryResults> {
        let is_projection = self.options.is_projection();
        let mut from_cache = false;

        let mut results: Option<Vec<Entity>> = None;
        if !is_projection && self.queries_by_key.len() == 1 {
            // Construction guarantees at least one key group
            let key = self.queries_by_key.keys().next().unwrap();
            if let Some(entity) = self.cache.get_by_key(key)? {
                Logger::trace("STRATEGY_SELECTED", &[("strategy", "cache_hit")]);
                // Already authoritative: skip repopulation below
                from_cache = true;
                results = Some(vec![entity]);
            }
        }

        let mut results = match results {
            Some(found) => found,
            None if is_projection => {
                Logger::trace(
                    "STRATEGY_SELECTED",
                    &[
                        ("strategy", "projection_multi_query"),
                        ("keys", &self.queries_by_key.len().to_string()),
                    ],
                );
                self.run_projection(limit, offset)?
            }
            None => {
                Logger::trace(
                    "STRATEGY_SELECTED",
                    &[
                        ("strategy", "get_multi"),
                        ("keys", &self.queries_by_key.len().to_string()),
                    ],
                );
                let keys: Vec<Key> = self.queries_by_key.keys().cloned().collect();
                // Unresolved keys (deleted concurrently) drop out here
                self.connection
                    .get_multi(&keys)?
                    .into_iter()
                    .flatten()
                    .collect()
            }
        };

        // One final in-memory sort: batched gets return results in key
        // order, and correct pagination needs the shared global order.
        let mut comparator = EntityComparator::new(self.ordering.clone());
        results.sort_by(|a, b| comparator.compare(a, b));

        if !is_projection && !from_cache && !results.is_empty() {
            self.cache.put(
                &self.kind,
                &results,
                CachingSituation::DatastoreGet,
                self.namespace.as_deref(),
            )?;
        }

        // Projection-path entities already match by construction (the
        // filters became the ancestor scope); everything else re-checks
        // against the originating key group.
        let groups = if is_projection {
            None
        } else {
            Some(self.queries_by_key.clone())
        };

        Ok(QueryResults::new(
            results,
            groups,
            self.options.clone(),
            offset,
            limit,
        ))
    }

    /// Counts the results of `run` with the same bounds
    pub fn count(&self, limit: Option<usize>, offset: Option<usize>) -> QueryResult<usize> {
        Ok(self.run(limit, offset)?.count())
    }

    /// Ancestor-rewritten projection fetch.
    ///
    /// Assumes projection ancestor queries are cheaper than a full
    /// `get_multi` for the common small key counts: less data over the
    /// wire, at the cost of more round trips.
    fn run_projection(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> QueryResult<Vec<Entity>> {
        let to_fetch = RunOptions::to_fetch(limit, offset);

        // Ordering columns missing from the projection are added so the
        // final in-memory sort can see them.
        let projected: BTreeSet<String> = self
            .options
            .projection
            .clone()
            .unwrap_or_default();
        let additional: BTreeSet<String> = self
            .ordering
            .property_columns()
            .filter(|column| !projected.contains(*column))
            .map(str::to_string)
            .collect();

        let mut batch: Vec<SubQuery> = Vec::new();
        let mut results: Vec<Entity> = Vec::new();

        for (key, queries) in &self.queries_by_key {
            for query in queries {
                let mut rewritten = query.clone();
                if !additional.is_empty() {
                    let projection = rewritten
                        .options
                        .projection
                        .get_or_insert_with(BTreeSet::new);
                    projection.extend(additional.iter().cloned());
                }
                rewritten.ancestor = Some(key.clone());

                batch.push(rewritten);
                if batch.len() == MAX_MERGE_QUERIES {
                    results.extend(self.run_batch(mem::take(&mut batch), &to_fetch)?);
                }
            }
        }
        if !batch.is_empty() {
            results.extend(self.run_batch(batch, &to_fetch)?);
        }

        Ok(results)
    }

    /// Runs one batch: directly for a single query, merged otherwise
    fn run_batch(&self, queries: Vec<SubQuery>, options: &RunOptions) -> QueryResult<Vec<Entity>> {
        if queries.len() == 1 {
            return self.connection.run_query(&queries[0], options);
        }

        let sources: Vec<ConnectionQuery<'_, D>> = queries
            .into_iter()
            .map(|query| ConnectionQuery {
                connection: self.connection,
                query,
            })
            .collect();

        let merged = MultiQueryMerger::new(sources, self.ordering.clone()).run(options)?;
        Ok(merged.collect())
    }
}

/// Planned key-based execution: the dispatcher proper, or the null
/// fallback when no sub-queries (and so no key groups) exist.
pub enum KeyedQuery<'a, D: DatastoreConnection, C: ResultCache> {
    ByKeys(QueryByKeys<'a, D, C>),
    Null(NullQuery),
}

impl<'a, D: DatastoreConnection, C: ResultCache> KeyedQuery<'a, D, C> {
    /// Plans the execution for a (possibly empty) set of key-filtered
    /// sub-queries
    pub fn plan(
        connection: &'a D,
        cache: &'a C,
        kind: impl Into<String>,
        queries: Vec<SubQuery>,
        ordering: OrderingSpec,
        namespace: Option<String>,
    ) -> QueryResult<Self> {
        if queries.is_empty() {
            return Ok(KeyedQuery::Null(NullQuery));
        }
        Ok(KeyedQuery::ByKeys(QueryByKeys::new(
            connection, cache, kind, queries, ordering, namespace,
        )?))
    }

    /// Runs the planned execution
    pub fn run(&self, limit: Option<usize>, offset: Option<usize>) -> QueryResult<QueryResults> {
        match self {
            KeyedQuery::ByKeys(query) => query.run(limit, offset),
            KeyedQuery::Null(query) => Ok(query.run(limit, offset)),
        }
    }

    /// Counts the planned execution's results
    pub fn count(&self, limit: Option<usize>, offset: Option<usize>) -> QueryResult<usize> {
        match self {
            KeyedQuery::ByKeys(query) => query.count(limit, offset),
            KeyedQuery::Null(query) => Ok(query.count(limit, offset)),
        }
    }
}
