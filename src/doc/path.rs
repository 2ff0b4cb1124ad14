// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Mutation-layer addresses: a document key plus a subkey path, without a
//! timestamp.

use std::fmt;

use super::doc_key::DocKey;
use super::error::DocResult;
use super::key_bytes::KeyBytes;
use super::primitive::PrimitiveValue;

/// The address a mutation targets: which document, and which node inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    doc_key: DocKey,
    subkeys: Vec<PrimitiveValue>,
}

impl DocPath {
    pub fn new(doc_key: DocKey, subkeys: Vec<PrimitiveValue>) -> Self {
        Self { doc_key, subkeys }
    }

    /// Addresses the document root itself.
    pub fn root(doc_key: DocKey) -> Self {
        Self::new(doc_key, Vec::new())
    }

    #[inline]
    pub fn doc_key(&self) -> &DocKey {
        &self.doc_key
    }

    #[inline]
    pub fn subkeys(&self) -> &[PrimitiveValue] {
        &self.subkeys
    }

    #[inline]
    pub fn num_subkeys(&self) -> usize {
        self.subkeys.len()
    }

    /// Extends the path by one subkey.
    pub fn push_subkey(&mut self, subkey: PrimitiveValue) {
        self.subkeys.push(subkey);
    }

    /// Returns a child path.
    pub fn child(&self, subkey: PrimitiveValue) -> DocPath {
        let mut child = self.clone();
        child.push_subkey(subkey);
        child
    }

    /// Encodes the document-key portion of the path.
    pub fn encoded_doc_key(&self) -> DocResult<KeyBytes> {
        self.doc_key.encode()
    }

    /// Encodes the full path (document key plus subkeys, no timestamp).
    pub fn encode(&self) -> DocResult<KeyBytes> {
        let mut key = self.doc_key.encode()?;
        for subkey in &self.subkeys {
            key.append_primitive(subkey)?;
        }
        Ok(key)
    }

    /// Encoded prefixes from the document key down to the full path, in
    /// order. These are the units of lock acquisition: ancestors first, the
    /// target last.
    pub fn lock_prefixes(&self) -> DocResult<Vec<KeyBytes>> {
        let mut prefixes = Vec::with_capacity(1 + self.subkeys.len());
        let mut key = self.doc_key.encode()?;
        prefixes.push(key.clone());
        for subkey in &self.subkeys {
            key.append_primitive(subkey)?;
            prefixes.push(key.clone());
        }
        Ok(prefixes)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocPath({}, [", self.doc_key)?;
        for (i, subkey) in self.subkeys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{subkey}")?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(doc: &str, subkeys: &[&str]) -> DocPath {
        DocPath::new(
            DocKey::new(vec![PrimitiveValue::from(doc)]),
            subkeys.iter().map(|s| PrimitiveValue::from(*s)).collect(),
        )
    }

    #[test]
    fn test_encode_extends_doc_key() {
        let p = path("a", &["b"]);
        let doc_key = p.encoded_doc_key().unwrap();
        let full = p.encode().unwrap();
        assert!(full.starts_with(doc_key.as_slice()));
        assert!(full.len() > doc_key.len());
    }

    #[test]
    fn test_lock_prefixes_are_nested() {
        let p = path("a", &["b", "c"]);
        let prefixes = p.lock_prefixes().unwrap();
        assert_eq!(prefixes.len(), 3);
        for pair in prefixes.windows(2) {
            assert!(pair[1].starts_with(pair[0].as_slice()));
        }
        assert_eq!(prefixes[2], p.encode().unwrap());
    }

    #[test]
    fn test_root_path_has_single_lock_prefix() {
        let p = DocPath::root(DocKey::new(vec![PrimitiveValue::from("a")]));
        assert_eq!(p.lock_prefixes().unwrap().len(), 1);
    }

    #[test]
    fn test_child() {
        let p = path("a", &[]);
        let c = p.child(PrimitiveValue::from("b"));
        assert_eq!(c.num_subkeys(), 1);
        assert_eq!(c.doc_key(), p.doc_key());
    }
}
