//! Ordering specifications
//!
//! An ordering spec is an ordered sequence of (column, direction) pairs,
//! fixed for the lifetime of one query execution and shared read-only by
//! every sub-query being merged. The `__key__` pseudo-column names entity
//! identity; the comparator always falls back to an ascending key
//! comparison, which is equivalent to appending `__key__` when absent.

use serde::{Deserialize, Serialize};

/// Pseudo-column naming entity identity in filters and orderings
pub const KEY_COLUMN: &str = "__key__";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One column of an ordering spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column to sort by (`__key__` for entity identity)
    pub column: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Multi-column ordering spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingSpec {
    columns: Vec<SortSpec>,
}

impl OrderingSpec {
    /// Creates an ordering over the given columns
    pub fn new(columns: Vec<SortSpec>) -> Self {
        Self { columns }
    }

    /// The empty ordering (pure key order)
    pub fn key_order() -> Self {
        Self::default()
    }

    /// Iterates the ordering columns in precedence order
    pub fn iter(&self) -> impl Iterator<Item = &SortSpec> {
        self.columns.iter()
    }

    /// Returns the ordered column names, excluding the key pseudo-column.
    ///
    /// These are the real properties a projection must carry for a correct
    /// in-memory sort.
    pub fn property_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(|spec| spec.column.as_str())
            .filter(|column| *column != KEY_COLUMN)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
