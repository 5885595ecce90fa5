//! Entity keys
//!
//! A key is the unique, orderable identity of one stored entity. It carries
//! an optional namespace and a non-empty path of (kind, id) elements; every
//! element before the last names an ancestor. Numeric ids order before
//! names within the same kind, matching the datastore's index order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier half of a path element: numeric id or string name.
///
/// The derived ordering puts all numeric ids before all names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyId {
    /// Auto-allocated or caller-chosen numeric id
    Id(i64),
    /// Caller-chosen string name
    Name(String),
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Id(id) => write!(f, "{}", id),
            KeyId::Name(name) => write!(f, "{}", name),
        }
    }
}

/// One (kind, id) element of a key path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathElement {
    /// Entity kind
    pub kind: String,
    /// Identifier within the kind
    pub id: KeyId,
}

/// Unique, orderable identifier for an entity.
///
/// The derived total order (namespace, then path) is the order the
/// comparator falls back to for tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    namespace: Option<String>,
    path: Vec<PathElement>,
}

impl Key {
    /// Creates a root key with a numeric id
    pub fn with_id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            namespace: None,
            path: vec![PathElement {
                kind: kind.into(),
                id: KeyId::Id(id),
            }],
        }
    }

    /// Creates a root key with a string name
    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            path: vec![PathElement {
                kind: kind.into(),
                id: KeyId::Name(name.into()),
            }],
        }
    }

    /// Moves the key into a namespace
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Creates a child key under this one
    pub fn child(&self, kind: impl Into<String>, id: KeyId) -> Self {
        let mut path = self.path.clone();
        path.push(PathElement {
            kind: kind.into(),
            id,
        });
        Self {
            namespace: self.namespace.clone(),
            path,
        }
    }

    /// Returns the namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the kind of the entity this key identifies (last path element)
    pub fn kind(&self) -> &str {
        // Construction guarantees a non-empty path
        &self.path[self.path.len() - 1].kind
    }

    /// Returns the identifier of the last path element
    pub fn id(&self) -> &KeyId {
        &self.path[self.path.len() - 1].id
    }

    /// Returns the full path
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Returns the parent key, or None for a root key
    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            namespace: self.namespace.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Returns true if `other` is this key or one of its descendants.
    ///
    /// Ancestor scope requires an identical namespace and a path prefix
    /// match, the same containment rule ancestor queries use.
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        self.namespace == other.namespace
            && other.path.len() >= self.path.len()
            && other.path[..self.path.len()] == self.path[..]
    }
}

// Key rendering is only for logs and error messages; the wire form belongs
// to the datastore collaborator.
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{}!", ns)?;
        }
        for (i, element) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}:{}", element.kind, element.id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_accessors() {
        let key = Key::with_id("book", 42);
        assert_eq!(key.kind(), "book");
        assert_eq!(key.id(), &KeyId::Id(42));
        assert_eq!(key.namespace(), None);
        assert!(key.parent().is_none());
    }

    #[test]
    fn test_child_and_parent() {
        let author = Key::with_name("author", "tolkien").in_namespace("library");
        let book = author.child("book", KeyId::Id(1));

        assert_eq!(book.kind(), "book");
        assert_eq!(book.namespace(), Some("library"));
        assert_eq!(book.parent(), Some(author));
    }

    #[test]
    fn test_ancestor_containment() {
        let author = Key::with_name("author", "tolkien");
        let book = author.child("book", KeyId::Id(1));
        let chapter = book.child("chapter", KeyId::Id(3));

        assert!(author.is_ancestor_of(&author));
        assert!(author.is_ancestor_of(&book));
        assert!(author.is_ancestor_of(&chapter));
        assert!(!book.is_ancestor_of(&author));

        // Same path, different namespace: not contained
        let elsewhere = Key::with_name("author", "tolkien").in_namespace("other");
        assert!(!author.is_ancestor_of(&elsewhere));
    }

    #[test]
    fn test_numeric_ids_order_before_names() {
        let by_id = Key::with_id("book", 999);
        let by_name = Key::with_name("book", "a");
        assert!(by_id < by_name);
    }

    #[test]
    fn test_key_order_is_total_and_path_wise() {
        let mut keys = vec![
            Key::with_id("book", 3),
            Key::with_id("author", 7),
            Key::with_id("book", 1),
            Key::with_id("author", 7).child("book", KeyId::Id(1)),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                Key::with_id("author", 7),
                Key::with_id("author", 7).child("book", KeyId::Id(1)),
                Key::with_id("book", 1),
                Key::with_id("book", 3),
            ]
        );
    }

    #[test]
    fn test_display() {
        let key = Key::with_name("author", "tolkien")
            .in_namespace("library")
            .child("book", KeyId::Id(1));
        assert_eq!(format!("{}", key), "library!author:tolkien/book:1");
    }
}
