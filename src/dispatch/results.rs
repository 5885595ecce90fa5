//! Result yielding
//!
//! One lazy pass over the sorted result buffer: per-sub-query re-filter,
//! offset skipping, limit accounting and options-driven conversion. Every
//! execution strategy funnels through this iterator, so pagination and
//! result-shape semantics cannot drift between strategies.

use std::collections::BTreeMap;

use crate::model::{Entity, Key};
use crate::query::{QueryOptions, SubQuery};

use super::filters::QueryFilter;

/// One yielded result: a bare key, a projection-trimmed entity, or a full
/// entity, depending on the query options.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultItem {
    Key(Key),
    Entity(Entity),
}

impl ResultItem {
    /// Returns the key of the underlying entity
    pub fn key(&self) -> &Key {
        match self {
            ResultItem::Key(key) => key,
            ResultItem::Entity(entity) => entity.key(),
        }
    }

    /// Returns the entity, if this is not a keys-only result
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            ResultItem::Key(_) => None,
            ResultItem::Entity(entity) => Some(entity),
        }
    }
}

/// Shapes one entity according to the query options
pub(crate) fn convert_for_options(entity: Entity, options: &QueryOptions) -> ResultItem {
    if options.keys_only {
        return ResultItem::Key(entity.key().clone());
    }
    if let Some(projection) = &options.projection {
        if !projection.is_empty() {
            return ResultItem::Entity(entity.trimmed_to(projection));
        }
    }
    ResultItem::Entity(entity)
}

/// Lazy iterator over post-processed results.
///
/// Offset skips only entities that match their originating sub-queries;
/// limit counts only yielded items. When `groups` is absent the buffer is
/// already known to match (projection path, unique path) and no re-filter
/// runs.
pub struct QueryResults {
    entities: std::vec::IntoIter<Entity>,
    groups: Option<BTreeMap<Key, Vec<SubQuery>>>,
    options: QueryOptions,
    to_skip: usize,
    remaining: Option<usize>,
}

impl QueryResults {
    pub(crate) fn new(
        entities: Vec<Entity>,
        groups: Option<BTreeMap<Key, Vec<SubQuery>>>,
        options: QueryOptions,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Self {
        Self {
            entities: entities.into_iter(),
            groups,
            options,
            to_skip: offset.unwrap_or(0),
            remaining: limit,
        }
    }

    /// The empty result set
    pub fn empty() -> Self {
        Self::new(Vec::new(), None, QueryOptions::default(), None, None)
    }
}

impl Iterator for QueryResults {
    type Item = ResultItem;

    fn next(&mut self) -> Option<ResultItem> {
        if self.remaining == Some(0) {
            return None;
        }

        loop {
            let entity = self.entities.next()?;

            if let Some(groups) = &self.groups {
                let matched = groups
                    .get(entity.key())
                    .is_some_and(|queries| {
                        queries.iter().any(|query| QueryFilter::matches(&entity, query))
                    });
                if !matched {
                    continue;
                }
            }

            if self.to_skip > 0 {
                self.to_skip -= 1;
                continue;
            }

            if let Some(remaining) = &mut self.remaining {
                *remaining -= 1;
            }
            return Some(convert_for_options(entity, &self.options));
        }
    }
}
