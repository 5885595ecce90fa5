//! Multi-column entity comparison
//!
//! Compares two entities under a shared ordering spec. Repeated (list)
//! properties are never compared wholesale: the datastore indexes a
//! repeated property by its per-direction extremum, so descending order
//! compares the minimum element and ascending order the maximum. The
//! extremum for each (entity key, column) pair is extracted once per
//! comparator instance and memoized.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Entity, Key, Value};
use crate::query::{OrderingSpec, SortDirection, SortSpec, KEY_COLUMN};

/// Passive counters for comparator behavior
#[derive(Debug, Default, Clone)]
pub struct ComparatorStats {
    /// Number of list-extremum extractions performed (one per
    /// (entity key, column) pair, not one per comparison)
    pub extremum_computations: u64,
}

/// Three-way entity comparator for one merge or sort execution.
///
/// The memo cache is private to one instance; instances are cheap and must
/// not be shared across executions.
#[derive(Debug)]
pub struct EntityComparator {
    ordering: OrderingSpec,
    min_max_cache: HashMap<(Key, String), Value>,
    stats: ComparatorStats,
}

impl EntityComparator {
    /// Creates a comparator over an ordering spec
    pub fn new(ordering: OrderingSpec) -> Self {
        Self {
            ordering,
            min_max_cache: HashMap::new(),
            stats: ComparatorStats::default(),
        }
    }

    /// Compares two entities under the ordering spec.
    ///
    /// The first nonzero ordering column decides; a full tie falls back to
    /// the ascending key comparison, so the result is a total order and
    /// equal-rank entities come out deterministically.
    pub fn compare(&mut self, lhs: &Entity, rhs: &Entity) -> Ordering {
        let Self {
            ordering,
            min_max_cache,
            stats,
        } = self;

        for spec in ordering.iter() {
            let lhs_value = resolve_column(min_max_cache, stats, lhs, spec);
            let rhs_value = resolve_column(min_max_cache, stats, rhs, spec);

            let mut result = lhs_value.compare(&rhs_value);
            if spec.direction == SortDirection::Desc {
                result = result.reverse();
            }
            if result != Ordering::Equal {
                return result;
            }
        }

        lhs.key().cmp(rhs.key())
    }

    /// Returns the passive counters
    pub fn stats(&self) -> &ComparatorStats {
        &self.stats
    }
}

/// Resolves the value one ordering column contributes for an entity.
///
/// `__key__` resolves to entity identity, a missing property to `Null`,
/// and a list to its memoized orientation-dependent extremum.
fn resolve_column(
    min_max_cache: &mut HashMap<(Key, String), Value>,
    stats: &mut ComparatorStats,
    entity: &Entity,
    spec: &SortSpec,
) -> Value {
    if spec.column == KEY_COLUMN {
        return Value::Key(entity.key().clone());
    }

    match entity.property(&spec.column) {
        None => Value::Null,
        Some(Value::List(items)) => min_max_cache
            .entry((entity.key().clone(), spec.column.clone()))
            .or_insert_with(|| {
                stats.extremum_computations += 1;
                list_extremum(items, spec.direction)
            })
            .clone(),
        Some(value) => value.clone(),
    }
}

/// Extracts the sort-relevant element of a repeated property: the minimum
/// under descending order, the maximum under ascending order. An empty
/// list contributes `Null`.
fn list_extremum(items: &[Value], direction: SortDirection) -> Value {
    let mut extremum: Option<&Value> = None;
    for item in items {
        extremum = match extremum {
            None => Some(item),
            Some(current) => {
                let replace = match direction {
                    SortDirection::Desc => item.compare(current) == Ordering::Less,
                    SortDirection::Asc => item.compare(current) == Ordering::Greater,
                };
                if replace {
                    Some(item)
                } else {
                    Some(current)
                }
            }
        };
    }
    extremum.cloned().unwrap_or(Value::Null)
}
