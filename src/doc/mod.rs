// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The document data model and its on-disk encodings.
//!
//! Documents are trees of primitive-keyed objects with primitive leaves. The
//! store projects them onto a flat ordered keyspace:
//!
//! ```text
//! [doc key] [group-end] [~hybrid_time]                       -> doc marker/value
//! [doc key] [subkey_a]  [group-end] [~hybrid_time]           -> a's marker/value
//! [doc key] [subkey_a] [subkey_b] [group-end] [~hybrid_time] -> b's marker/value
//! ```
//!
//! Key encodings preserve sort order bytewise (see [`PrimitiveValue`]), hybrid
//! times are complemented so newer versions sort first, and the group-end
//! marker keeps a node's own entries ahead of its descendants'. These three
//! properties together are what make every read a short forward scan.
//!
//! The encodings in this module are the persistence contract: byte layouts
//! and type codes must stay stable across versions.

mod doc_key;
mod error;
mod key_bytes;
mod path;
mod primitive;
mod subdocument;
mod value;
mod value_type;

pub use doc_key::{DocKey, SubDocKey};
pub use error::{DocError, DocResult};
pub use key_bytes::KeyBytes;
pub use path::DocPath;
pub use primitive::PrimitiveValue;
pub use subdocument::SubDocument;
pub use value::{Ttl, Value};
pub use value_type::ValueType;
