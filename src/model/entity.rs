//! Entities
//!
//! An entity is an opaque mapping from column name to value plus an
//! immutable key. This engine never constructs entities from scratch in
//! production paths; collaborators produce them, the engine reads, trims
//! and re-orders them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::key::Key;
use super::value::Value;

/// Reserved column carrying the polymorphic type marker.
///
/// Projection trimming always retains this column when present, so a
/// polymorphic model can still be resolved from a trimmed entity.
pub const CLASS_COLUMN: &str = "class";

/// One stored record: a key plus named properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    key: Key,
    properties: BTreeMap<String, Value>,
}

impl Entity {
    /// Creates an entity with no properties (also the keys-only shape)
    pub fn new(key: Key) -> Self {
        Self {
            key,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(column.into(), value.into());
        self
    }

    /// Builds an entity from a JSON document (test and ingestion bridge).
    ///
    /// Non-object documents produce an entity with no properties.
    pub fn from_json(key: Key, document: &serde_json::Value) -> Self {
        let mut entity = Self::new(key);
        if let Some(map) = document.as_object() {
            for (column, value) in map {
                entity
                    .properties
                    .insert(column.clone(), Value::from_json(value));
            }
        }
        entity
    }

    /// Returns the entity key
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns a property value, if present
    pub fn property(&self, column: &str) -> Option<&Value> {
        self.properties.get(column)
    }

    /// Returns all properties in column order
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Returns a copy trimmed to the projected columns.
    ///
    /// The reserved polymorphic class column survives trimming when present.
    pub fn trimmed_to(&self, projection: &BTreeSet<String>) -> Entity {
        let properties = self
            .properties
            .iter()
            .filter(|(column, _)| projection.contains(*column) || *column == CLASS_COLUMN)
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();
        Self {
            key: self.key.clone(),
            properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_lookup() {
        let entity = Entity::new(Key::with_id("book", 1))
            .with_property("title", "The Hobbit")
            .with_property("pages", 310i64);

        assert_eq!(entity.key(), &Key::with_id("book", 1));
        assert_eq!(
            entity.property("title"),
            Some(&Value::String("The Hobbit".into()))
        );
        assert_eq!(entity.property("missing"), None);
    }

    #[test]
    fn test_from_json() {
        let entity = Entity::from_json(
            Key::with_id("book", 1),
            &json!({"title": "The Hobbit", "tags": ["fantasy", "classic"]}),
        );

        assert_eq!(
            entity.property("tags"),
            Some(&Value::List(vec![
                Value::String("fantasy".into()),
                Value::String("classic".into()),
            ]))
        );
    }

    #[test]
    fn test_trimming_keeps_class_column() {
        let entity = Entity::from_json(
            Key::with_id("book", 1),
            &json!({"title": "x", "pages": 1, "class": "Novel"}),
        );

        let projection: BTreeSet<String> = ["title".to_string()].into_iter().collect();
        let trimmed = entity.trimmed_to(&projection);

        assert_eq!(trimmed.key(), entity.key());
        assert!(trimmed.property("title").is_some());
        assert!(trimmed.property("class").is_some());
        assert!(trimmed.property("pages").is_none());
    }
}
