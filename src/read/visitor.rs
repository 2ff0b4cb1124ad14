// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Visitor interface for subtree scans.

use crate::doc::{DocError, DocResult, PrimitiveValue, SubDocKey, SubDocument};

/// Consumes the events of a subtree scan.
///
/// Object contents arrive as alternating `visit_key` / child-content events,
/// in key order. Any callback may fail; the scan aborts with that failure.
pub trait DocVisitor {
    /// Called once at the beginning of the scanned subtree.
    fn start_sub_document(&mut self, key: &SubDocKey) -> DocResult<()>;

    /// Called once at the end of the scanned subtree.
    fn end_sub_document(&mut self) -> DocResult<()>;

    fn visit_key(&mut self, key: &PrimitiveValue) -> DocResult<()>;

    fn visit_value(&mut self, value: &PrimitiveValue) -> DocResult<()>;

    fn start_object(&mut self) -> DocResult<()>;

    fn end_object(&mut self) -> DocResult<()>;

    /// Arrays are reserved; these callbacks exist for forward compatibility.
    fn start_array(&mut self) -> DocResult<()>;

    fn end_array(&mut self) -> DocResult<()>;
}

/// A visitor that materializes the scanned subtree as a [`SubDocument`].
#[derive(Debug, Default)]
pub struct SubDocumentBuildingVisitor {
    stack: Vec<SubDocument>,
    keys: Vec<PrimitiveValue>,
    root: Option<SubDocument>,
}

impl SubDocumentBuildingVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The materialized subtree, or `None` when the scan found nothing.
    pub fn into_result(self) -> Option<SubDocument> {
        self.root
    }

    fn attach(&mut self, node: SubDocument) -> DocResult<()> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(DocError::InvariantViolation(
                        "visitor received multiple roots".into(),
                    ));
                }
                self.root = Some(node);
                Ok(())
            }
            Some(SubDocument::Object(map)) => {
                let key = self.keys.pop().ok_or_else(|| {
                    DocError::InvariantViolation("visitor received a value without a key".into())
                })?;
                map.insert(key, node);
                Ok(())
            }
            Some(_) => Err(DocError::InvariantViolation(
                "visitor has a non-object container open".into(),
            )),
        }
    }
}

impl DocVisitor for SubDocumentBuildingVisitor {
    fn start_sub_document(&mut self, _key: &SubDocKey) -> DocResult<()> {
        self.stack.clear();
        self.keys.clear();
        self.root = None;
        Ok(())
    }

    fn end_sub_document(&mut self) -> DocResult<()> {
        if !self.stack.is_empty() {
            return Err(DocError::InvariantViolation(
                "subtree ended with unclosed objects".into(),
            ));
        }
        Ok(())
    }

    fn visit_key(&mut self, key: &PrimitiveValue) -> DocResult<()> {
        if self.stack.is_empty() {
            return Err(DocError::InvariantViolation(
                "visitor received a key outside an object".into(),
            ));
        }
        self.keys.push(key.clone());
        Ok(())
    }

    fn visit_value(&mut self, value: &PrimitiveValue) -> DocResult<()> {
        self.attach(SubDocument::Primitive(value.clone()))
    }

    fn start_object(&mut self) -> DocResult<()> {
        self.stack.push(SubDocument::object());
        Ok(())
    }

    fn end_object(&mut self) -> DocResult<()> {
        let object = self.stack.pop().ok_or_else(|| {
            DocError::InvariantViolation("unbalanced end of object".into())
        })?;
        self.attach(object)
    }

    fn start_array(&mut self) -> DocResult<()> {
        Err(DocError::BadArgument("arrays are reserved".into()))
    }

    fn end_array(&mut self) -> DocResult<()> {
        Err(DocError::BadArgument("arrays are reserved".into()))
    }
}
