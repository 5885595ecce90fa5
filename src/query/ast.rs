//! Logical sub-query representation
//!
//! The explicit sub-query contract: kind, filters, ordering, options and
//! namespace, plus an optional ancestor scope. In the key-based dispatch
//! path every sub-query additionally carries an equality filter on the
//! `__key__` pseudo-column.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Key, Value};

use super::options::QueryOptions;
use super::ordering::{OrderingSpec, KEY_COLUMN};

/// Filter operation types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterOp {
    /// Equality: column = value
    Eq(Value),
    /// Greater than or equal: column >= value
    Gte(Value),
    /// Greater than: column > value
    Gt(Value),
    /// Less than or equal: column <= value
    Lte(Value),
    /// Less than: column < value
    Lt(Value),
}

impl FilterOp {
    /// Returns true if this is an equality operation
    pub fn is_equality(&self) -> bool {
        matches!(self, FilterOp::Eq(_))
    }

    /// Returns the operation name for log fields
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "eq",
            FilterOp::Gte(_) => "gte",
            FilterOp::Gt(_) => "gt",
            FilterOp::Lte(_) => "lte",
            FilterOp::Lt(_) => "lt",
        }
    }
}

/// A single predicate (column + operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Column name (`__key__` for entity identity)
    pub column: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Predicate {
    /// Create an equality predicate
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq(value.into()),
        }
    }

    /// Create a range predicate (gte)
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Gte(value.into()),
        }
    }

    /// Create a range predicate (gt)
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Gt(value.into()),
        }
    }

    /// Create a range predicate (lte)
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Lte(value.into()),
        }
    }

    /// Create a range predicate (lt)
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Lt(value.into()),
        }
    }

    /// Create the key equality predicate used by the dispatch path
    pub fn key_eq(key: Key) -> Self {
        Self {
            column: KEY_COLUMN.to_string(),
            op: FilterOp::Eq(Value::Key(key)),
        }
    }

    /// Returns true if this is the `__key__ =` predicate
    pub fn is_key_equality(&self) -> bool {
        self.column == KEY_COLUMN && self.op.is_equality()
    }
}

/// One logical sub-query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuery {
    /// Target entity kind
    pub kind: String,
    /// Namespace the query runs in
    pub namespace: Option<String>,
    /// Filter predicates (AND semantics)
    pub filters: Vec<Predicate>,
    /// Shared ordering spec
    pub ordering: OrderingSpec,
    /// Result-shape options
    pub options: QueryOptions,
    /// Ancestor scope, if this was rewritten as an ancestor query
    pub ancestor: Option<Key>,
}

impl SubQuery {
    /// Creates a sub-query over a kind
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: None,
            filters: Vec::new(),
            ordering: OrderingSpec::key_order(),
            options: QueryOptions::default(),
            ancestor: None,
        }
    }

    /// Sets the namespace
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adds a predicate
    pub fn with_filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Adds an equality filter
    pub fn filter_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_filter(Predicate::eq(column, value))
    }

    /// Adds the `__key__ =` filter
    pub fn filter_key(self, key: Key) -> Self {
        self.with_filter(Predicate::key_eq(key))
    }

    /// Sets the ordering spec
    pub fn with_ordering(mut self, ordering: OrderingSpec) -> Self {
        self.ordering = ordering;
        self
    }

    /// Sets the result-shape options
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Requests a column projection
    pub fn with_projection(mut self, columns: BTreeSet<String>) -> Self {
        self.options.projection = Some(columns);
        self
    }

    /// Requests bare keys only
    pub fn keys_only(mut self) -> Self {
        self.options.keys_only = true;
        self
    }

    /// Scopes the query to descendants of a key
    pub fn with_ancestor(mut self, ancestor: Key) -> Self {
        self.ancestor = Some(ancestor);
        self
    }

    /// Returns the key bound by the `__key__ =` filter, if any
    pub fn key_filter(&self) -> Option<&Key> {
        self.filters.iter().find_map(|predicate| {
            if !predicate.is_key_equality() {
                return None;
            }
            match &predicate.op {
                FilterOp::Eq(Value::Key(key)) => Some(key),
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ordering::SortSpec;

    #[test]
    fn test_builder() {
        let query = SubQuery::new("book")
            .in_namespace("library")
            .filter_eq("title", "The Hobbit")
            .with_ordering(OrderingSpec::new(vec![SortSpec::asc("title")]))
            .keys_only();

        assert_eq!(query.kind, "book");
        assert_eq!(query.namespace.as_deref(), Some("library"));
        assert_eq!(query.filters.len(), 1);
        assert!(query.options.keys_only);
    }

    #[test]
    fn test_key_filter_extraction() {
        let key = Key::with_id("book", 7);
        let query = SubQuery::new("book")
            .filter_eq("title", "x")
            .filter_key(key.clone());

        assert_eq!(query.key_filter(), Some(&key));
        assert!(SubQuery::new("book").key_filter().is_none());
    }

    #[test]
    fn test_key_inequality_is_not_a_key_filter() {
        let query = SubQuery::new("book").with_filter(Predicate {
            column: super::KEY_COLUMN.to_string(),
            op: FilterOp::Gte(Value::Key(Key::with_id("book", 1))),
        });
        assert!(query.key_filter().is_none());
    }

    #[test]
    fn test_op_names() {
        assert_eq!(Predicate::gt("a", 1i64).op.op_name(), "gt");
        assert_eq!(Predicate::lte("a", 1i64).op.op_name(), "lte");
        assert!(Predicate::key_eq(Key::with_id("b", 1)).is_key_equality());
    }
}
