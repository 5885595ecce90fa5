//! Key-based execution strategies
//!
//! Strategy selection and post-processing for queries whose candidate
//! keys are already known, plus the cache-first unique-constraint lookup
//! and the null fallback.
//!
//! # Invariants
//!
//! - Output order is the shared ordering spec's order for every strategy
//! - Each entity key is yielded at most once
//! - Projection execution never reads or writes the result cache
//! - The cache is only ever populated from consistent datastore reads

mod by_keys;
mod connection;
mod filters;
mod null;
mod results;
mod unique;

pub use by_keys::{KeyedQuery, QueryByKeys, MAX_MERGE_QUERIES};
pub use connection::{CachingSituation, DatastoreConnection, ResultCache};
pub use filters::QueryFilter;
pub use null::NullQuery;
pub use results::{QueryResults, ResultItem};
pub use unique::UniqueQuery;
