//! Unique-constraint point query
//!
//! Mimics a normal query but hits the result cache when possible. The
//! caller guarantees the wrapped query's filters form a unique constraint,
//! so it matches at most one entity; this strategy only optimizes lookup
//! under that assumption, it never enforces it.

use crate::errors::QueryResult;
use crate::model::{Entity, Key};
use crate::observability::Logger;
use crate::query::{RunOptions, SubQuery};

use super::connection::{CachingSituation, DatastoreConnection, ResultCache};
use super::filters::QueryFilter;
use super::results::QueryResults;

/// Cache-first execution of a query matching at most one entity
pub struct UniqueQuery<'a, D: DatastoreConnection, C: ResultCache> {
    connection: &'a D,
    cache: &'a C,
    identifier: String,
    query: SubQuery,
    namespace: Option<String>,
}

impl<'a, D: DatastoreConnection, C: ResultCache> UniqueQuery<'a, D, C> {
    /// Creates a unique query.
    ///
    /// `identifier` names the unique constraint's value in the cache; the
    /// namespace is passed explicitly rather than read back out of the
    /// query.
    pub fn new(
        connection: &'a D,
        cache: &'a C,
        identifier: impl Into<String>,
        query: SubQuery,
        namespace: Option<String>,
    ) -> Self {
        Self {
            connection,
            cache,
            identifier: identifier.into(),
            query,
            namespace,
        }
    }

    /// Target entity kind
    pub fn kind(&self) -> &str {
        &self.query.kind
    }

    /// The wrapped query
    pub fn query(&self) -> &SubQuery {
        &self.query
    }

    /// Runs the lookup, yielding the matching entity if one exists.
    ///
    /// Concurrent writes violating the constraint can surface more than
    /// one entity; all survivors are yielded.
    pub fn run(&self, limit: Option<usize>, offset: Option<usize>) -> QueryResult<QueryResults> {
        let options = self.query.options.clone();

        // Cache semantics only apply to full-entity point lookups
        if options.keys_only || options.is_projection() {
            let entities = self
                .connection
                .run_query(&self.query, &RunOptions::new(limit, offset))?;
            return Ok(QueryResults::new(entities, None, options, None, None));
        }

        let mut cached = self
            .cache
            .get_by_identifier(&self.identifier, self.namespace.as_deref())?;
        if let Some(entity) = &cached {
            if !QueryFilter::matches(entity, &self.query) {
                // A field changed since caching; treat as a miss
                Logger::trace(
                    "UNIQUE_CACHE_STALE",
                    &[("identifier", self.identifier.as_str())],
                );
                cached = None;
            }
        }

        if let Some(entity) = cached {
            Logger::trace(
                "UNIQUE_CACHE_HIT",
                &[("identifier", self.identifier.as_str())],
            );
            return Ok(QueryResults::new(vec![entity], None, options, None, None));
        }

        // Fast keys-only probe with the same filters, then a consistent
        // get so a possibly-stale cache copy never decides uniqueness.
        let mut keys_probe = self.query.clone();
        keys_probe.options.keys_only = true;
        keys_probe.options.projection = None;
        let keys: Vec<Key> = self
            .connection
            .run_query(&keys_probe, &RunOptions::new(limit, offset))?
            .into_iter()
            .map(|entity| entity.key().clone())
            .collect();

        let survivors: Vec<Entity> = self
            .connection
            .get_multi(&keys)?
            .into_iter()
            .flatten()
            .filter(|entity| QueryFilter::matches(entity, &self.query))
            .collect();

        if survivors.len() == 1 {
            self.cache.put(
                &self.query.kind,
                &survivors,
                CachingSituation::DatastoreGet,
                self.namespace.as_deref(),
            )?;
        }

        Ok(QueryResults::new(survivors, None, options, None, None))
    }

    /// Counts the results of `run` with the same bounds
    pub fn count(&self, limit: Option<usize>, offset: Option<usize>) -> QueryResult<usize> {
        Ok(self.run(limit, offset)?.count())
    }
}
