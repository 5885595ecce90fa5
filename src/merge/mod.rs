//! Multi-query merge subsystem
//!
//! Bounded concurrent fan-out over independent sub-queries plus a
//! streaming k-way merge under a shared ordering spec.
//!
//! # Guarantees
//!
//! - Merged output is sorted per the ordering spec and contains each
//!   entity key at most once
//! - Output is identical for any concurrency ceiling; concurrency is a
//!   performance knob, never a source of nondeterminism
//! - Any sub-query failure fails the whole merge; no partial results

mod comparator;
mod config;
mod fanout;
mod merger;

pub use comparator::{ComparatorStats, EntityComparator};
pub use config::{MergeConfig, DEFAULT_WORKER_COUNT};
pub use merger::{MergeStats, MergedRun, MultiQueryMerger, QuerySource};
