//! External collaborator contracts
//!
//! The dispatcher owns no transport and no cache store; it drives both
//! through these traits. Implementations live with the surrounding
//! datastore integration.

use crate::errors::QueryResult;
use crate::model::{Entity, Key};
use crate::query::{RunOptions, SubQuery};

/// Why entities are being written to the result cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachingSituation {
    /// Entities were just read from the datastore
    DatastoreGet,
    /// Entities were just written to the datastore
    DatastorePut,
}

/// Handle to the datastore's native query primitives.
///
/// `Send + Sync` because fan-out workers run sub-queries concurrently over
/// one shared handle.
pub trait DatastoreConnection: Send + Sync {
    /// Executes one sub-query natively (point scan, ancestor scan,
    /// keys-only or projection run). Keys-only runs may return entities
    /// without property data.
    fn run_query(&self, query: &SubQuery, options: &RunOptions) -> QueryResult<Vec<Entity>>;

    /// Batched, strongly-consistent key fetch. The result preserves input
    /// order; a key with no current entity yields `None`.
    fn get_multi(&self, keys: &[Key]) -> QueryResult<Vec<Option<Entity>>>;
}

/// Shared result cache, externally synchronized.
///
/// All operations are single-key and atomic from this engine's point of
/// view; no multi-key transactional guarantee is assumed.
pub trait ResultCache {
    /// Looks up a cached entity by its key
    fn get_by_key(&self, key: &Key) -> QueryResult<Option<Entity>>;

    /// Looks up a cached entity by a unique-constraint identifier
    fn get_by_identifier(
        &self,
        identifier: &str,
        namespace: Option<&str>,
    ) -> QueryResult<Option<Entity>>;

    /// Writes entities of one kind to the cache
    fn put(
        &self,
        kind: &str,
        entities: &[Entity],
        situation: CachingSituation,
        namespace: Option<&str>,
    ) -> QueryResult<()>;
}
