//! Query options
//!
//! `QueryOptions` describe the result shape a caller asked for; keys-only
//! and a non-empty projection are mutually exclusive with full entities.
//! `RunOptions` are the per-execution pagination bounds forwarded to each
//! sub-query run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Result-shape options shared by every sub-query of one logical query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Return bare keys only, no property data
    pub keys_only: bool,
    /// Return only these columns (None for full entities)
    pub projection: Option<BTreeSet<String>>,
    /// Maximum number of results to yield
    pub limit: Option<usize>,
    /// Number of matching results to skip before yielding
    pub offset: Option<usize>,
}

impl QueryOptions {
    /// Returns true if a non-empty projection was requested
    pub fn is_projection(&self) -> bool {
        self.projection
            .as_ref()
            .is_some_and(|columns| !columns.is_empty())
    }

    /// Pagination bounds for pushing down into sub-query runs
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Pagination bounds for one sub-query execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RunOptions {
    pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self { limit, offset }
    }

    /// Bound covering offset + limit rows, for push-down ahead of an
    /// in-memory re-sort that will re-apply the offset.
    pub fn to_fetch(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit: limit.map(|l| l + offset.unwrap_or(0)),
            offset: None,
        }
    }
}
