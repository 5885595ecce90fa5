//! Sub-query predicate evaluation against fetched entities
//!
//! Entities fetched by key or through ancestor rewriting may not satisfy
//! the sub-query that originally named their key, so the dispatcher
//! re-checks every fetched entity. Strict evaluation: missing columns and
//! nulls never match; a repeated property matches when any element does.

use std::cmp::Ordering;

use crate::model::{Entity, Value};
use crate::query::{FilterOp, Predicate, SubQuery, KEY_COLUMN};

/// Evaluates sub-queries against entities
pub struct QueryFilter;

impl QueryFilter {
    /// Checks whether an entity satisfies a sub-query: kind, namespace,
    /// ancestor scope and every filter predicate (AND semantics).
    pub fn matches(entity: &Entity, query: &SubQuery) -> bool {
        if entity.key().kind() != query.kind {
            return false;
        }
        if entity.key().namespace() != query.namespace.as_deref() {
            return false;
        }
        if let Some(ancestor) = &query.ancestor {
            if !ancestor.is_ancestor_of(entity.key()) {
                return false;
            }
        }
        query
            .filters
            .iter()
            .all(|predicate| Self::matches_predicate(entity, predicate))
    }

    /// Checks a single predicate
    fn matches_predicate(entity: &Entity, predicate: &Predicate) -> bool {
        if predicate.column == KEY_COLUMN {
            let identity = Value::Key(entity.key().clone());
            return Self::scalar_satisfies(&identity, &predicate.op);
        }

        let actual = match entity.property(&predicate.column) {
            Some(value) => value,
            None => return false, // Missing column = no match
        };

        // A repeated property matches when any element matches
        if let Value::List(items) = actual {
            return items
                .iter()
                .any(|item| Self::scalar_satisfies(item, &predicate.op));
        }

        Self::scalar_satisfies(actual, &predicate.op)
    }

    /// Applies one operation to one scalar value
    fn scalar_satisfies(actual: &Value, op: &FilterOp) -> bool {
        // Null values never match
        if matches!(actual, Value::Null) {
            return false;
        }

        match op {
            FilterOp::Eq(expected) => actual.compare(expected) == Ordering::Equal,
            FilterOp::Gte(bound) => actual.compare(bound) != Ordering::Less,
            FilterOp::Gt(bound) => actual.compare(bound) == Ordering::Greater,
            FilterOp::Lte(bound) => actual.compare(bound) != Ordering::Greater,
            FilterOp::Lt(bound) => actual.compare(bound) == Ordering::Less,
        }
    }
}
