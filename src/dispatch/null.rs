//! Null query
//!
//! Fixed empty-result strategy. Planning an empty key-group set resolves
//! to this, so the dispatcher core never special-cases "no keys".

use super::results::QueryResults;

/// A query that yields nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullQuery;

impl NullQuery {
    /// Yields no results
    pub fn run(&self, _limit: Option<usize>, _offset: Option<usize>) -> QueryResults {
        QueryResults::empty()
    }

    /// Counts no results
    pub fn count(&self, _limit: Option<usize>, _offset: Option<usize>) -> usize {
        0
    }
}
