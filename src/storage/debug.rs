// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Human-readable dump of the document keyspace.

use std::fmt::Write as _;

use crate::doc::{DocError, DocResult, SubDocKey, Value};

use super::store::Store;

/// Writes one line per stored entry, with the key decoded to
/// `(DocKey, [subkeys], HybridTime)` and the value to `(type, payload[, ttl])`.
///
/// Undecodable entries are printed as raw hex and the dump continues; the
/// first decode failure is returned once the dump is complete.
pub fn debug_dump(store: &dyn Store, out: &mut dyn std::fmt::Write) -> DocResult<()> {
    let mut first_error: Option<DocError> = None;
    let mut cursor = store.cursor()?;
    cursor.seek(&[])?;

    while let Some((key, value)) = cursor.entry() {
        match (SubDocKey::decode(key), Value::decode(value)) {
            (Ok(subdoc_key), Ok(decoded)) => {
                writeln!(out, "{subdoc_key} -> {decoded}").map_err(fmt_error)?;
            }
            (key_result, value_result) => {
                tracing::warn!(key = %hex(key), "undecodable entry in debug dump");
                writeln!(out, "!! {} -> {}", hex(key), hex(value)).map_err(fmt_error)?;
                if first_error.is_none() {
                    first_error = key_result.err().or_else(|| value_result.err());
                }
            }
        }
        cursor.next()?;
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Dump into a fresh string, folding any decode failure into the text.
pub fn debug_dump_to_string(store: &dyn Store) -> String {
    let mut out = String::new();
    if let Err(err) = debug_dump(store, &mut out) {
        let _ = writeln!(out, "!! first decode error: {err}");
    }
    out
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn fmt_error(_: std::fmt::Error) -> DocError {
    DocError::CorruptValue("formatter error during debug dump".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{DocKey, PrimitiveValue, Ttl};
    use crate::storage::MemStore;
    use crate::time::HybridTime;

    fn entry(subkeys: &[&str], ht: u64, value: Value) -> (Vec<u8>, Vec<u8>) {
        let key = SubDocKey::new(
            DocKey::new(vec![PrimitiveValue::from("doc")]),
            subkeys.iter().map(|s| PrimitiveValue::from(*s)).collect(),
            HybridTime::from_micros(ht),
        );
        (key.encode().unwrap().into_vec(), value.encode())
    }

    #[test]
    fn test_dump_decodes_entries() {
        let store = MemStore::new();
        store
            .write(&[
                entry(&[], 10, Value::object_marker()),
                entry(&["k"], 10, Value::from_primitive(PrimitiveValue::Int64(7))),
                entry(
                    &["t"],
                    12,
                    Value::new(PrimitiveValue::from("v"), Ttl::from_millis(500)),
                ),
            ])
            .unwrap();

        let dump = debug_dump_to_string(&store);
        assert!(dump.contains(r#"SubDocKey(DocKey([], ["doc"]), [; HT(10)]) -> {}"#));
        assert!(dump.contains(r#"["k"; HT(10)]) -> 7"#));
        assert!(dump.contains("TTL: 500ms"));
    }

    #[test]
    fn test_dump_continues_past_garbage() {
        let store = MemStore::new();
        store
            .write(&[
                (vec![0x01, 0x02], vec![0x03]),
                entry(&["k"], 10, Value::from_primitive(PrimitiveValue::Int64(7))),
            ])
            .unwrap();

        let mut out = String::new();
        let result = debug_dump(&store, &mut out);
        assert!(result.is_err());
        assert!(out.contains("!! 0102 -> 03"));
        assert!(out.contains(r#"["k"; HT(10)]"#), "dump must continue: {out}");
    }
}
