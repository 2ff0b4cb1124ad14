// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! In-memory document trees.

use std::collections::BTreeMap;
use std::fmt;

use super::primitive::PrimitiveValue;

/// A node of a document: a primitive leaf, an object, or an array.
///
/// Objects map primitive keys to child subdocuments; iteration order is the
/// key sort order, which matches the order children appear in the encoded
/// keyspace. Arrays are reserved and not stored in v1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubDocument {
    Primitive(PrimitiveValue),
    Object(BTreeMap<PrimitiveValue, SubDocument>),
    Array(Vec<SubDocument>),
}

impl SubDocument {
    /// An empty object.
    pub fn object() -> Self {
        SubDocument::Object(BTreeMap::new())
    }

    /// Builds an object from key/child pairs.
    pub fn object_from<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (PrimitiveValue, SubDocument)>,
    {
        SubDocument::Object(entries.into_iter().collect())
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, SubDocument::Primitive(_))
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, SubDocument::Object(_))
    }

    /// Looks up a direct child by key; `None` for leaves and missing keys.
    pub fn child(&self, key: &PrimitiveValue) -> Option<&SubDocument> {
        match self {
            SubDocument::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Inserts a direct child, turning the node into an object if needed.
    pub fn insert_child(&mut self, key: PrimitiveValue, child: SubDocument) {
        if !self.is_object() {
            *self = SubDocument::object();
        }
        if let SubDocument::Object(map) = self {
            map.insert(key, child);
        }
    }
}

impl From<PrimitiveValue> for SubDocument {
    fn from(p: PrimitiveValue) -> Self {
        SubDocument::Primitive(p)
    }
}

impl fmt::Display for SubDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubDocument::Primitive(p) => write!(f, "{p}"),
            SubDocument::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            SubDocument::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_iteration_follows_key_order() {
        let doc = SubDocument::object_from([
            (PrimitiveValue::from("z"), PrimitiveValue::Int64(1).into()),
            (PrimitiveValue::from("a"), PrimitiveValue::Int64(2).into()),
            (PrimitiveValue::Int64(5), PrimitiveValue::Int64(3).into()),
        ]);
        if let SubDocument::Object(map) = &doc {
            let keys: Vec<_> = map.keys().cloned().collect();
            // Int64 sorts before strings in the cross-type order.
            assert_eq!(
                keys,
                vec![
                    PrimitiveValue::Int64(5),
                    PrimitiveValue::from("a"),
                    PrimitiveValue::from("z"),
                ]
            );
        } else {
            panic!("expected object");
        }
    }

    #[test]
    fn test_child_lookup() {
        let doc = SubDocument::object_from([(
            PrimitiveValue::from("k"),
            PrimitiveValue::Int64(1).into(),
        )]);
        assert_eq!(
            doc.child(&PrimitiveValue::from("k")),
            Some(&SubDocument::Primitive(PrimitiveValue::Int64(1)))
        );
        assert!(doc.child(&PrimitiveValue::from("missing")).is_none());
    }

    #[test]
    fn test_insert_child_converts_leaf() {
        let mut doc = SubDocument::Primitive(PrimitiveValue::Null);
        doc.insert_child(PrimitiveValue::from("k"), PrimitiveValue::Int64(1).into());
        assert!(doc.is_object());
        assert!(doc.child(&PrimitiveValue::from("k")).is_some());
    }

    #[test]
    fn test_display() {
        let doc = SubDocument::object_from([(
            PrimitiveValue::from("b"),
            SubDocument::object_from([(
                PrimitiveValue::from("c"),
                PrimitiveValue::Int64(7).into(),
            )]),
        )]);
        assert_eq!(doc.to_string(), r#"{"b": {"c": 7}}"#);
    }
}
