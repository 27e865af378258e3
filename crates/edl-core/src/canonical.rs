//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only construction path for bytes that get hashed
//! into a block or signed by a wallet.
//!
//! ## Invariant
//!
//! The inner buffer is private and the sole constructor runs the full
//! pipeline:
//!
//! 1. Serialize the value into a `serde_json::Value` tree.
//! 2. Reject non-integer numbers. Grades, counters and nonces are strings
//!    or integers; floats have unstable textual forms across encoders.
//! 3. Emit RFC 8785 (JCS) output via `serde_jcs`: object keys sorted,
//!    compact separators, no trailing whitespace.
//!
//! Because block hashing and certificate signing both accept only
//! `&CanonicalBytes`, a block built from a `HashMap` and one built from a
//! struct with the same fields hash identically.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - Object keys are sorted lexicographically at every depth.
/// - No floating point numbers appear anywhere in the tree.
/// - The encoding is UTF-8 JSON with compact separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if the value contains
    /// a non-integer number, or [`CanonicalizationError::SerializationFailed`]
    /// if serde cannot represent the value as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical form as text. Always valid UTF-8 by construction.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Walk the value tree and fail on the first non-integer number.
fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn keys_are_sorted() {
        let data = serde_json::json!({"nonce": 7, "index": 1, "previous_hash": "0"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_str(), r#"{"index":1,"nonce":7,"previous_hash":"0"}"#);
    }

    #[test]
    fn nested_objects_are_sorted() {
        let data = serde_json::json!({
            "payload": {"type": "certificate_issued", "issuer_address": "ab12"},
            "index": 3
        });
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            cb.as_str(),
            r#"{"index":3,"payload":{"issuer_address":"ab12","type":"certificate_issued"}}"#
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut a = HashMap::new();
        a.insert("course", "Distributed Systems");
        a.insert("grade", "A");
        a.insert("subject", "alice");

        let mut b = HashMap::new();
        b.insert("subject", "alice");
        b.insert("grade", "A");
        b.insert("course", "Distributed Systems");

        assert_eq!(
            CanonicalBytes::new(&a).unwrap(),
            CanonicalBytes::new(&b).unwrap()
        );
    }

    #[test]
    fn floats_are_rejected() {
        let data = serde_json::json!({"grade": 3.7});
        match CanonicalBytes::new(&data) {
            Err(CanonicalizationError::FloatRejected(f)) => assert_eq!(f, 3.7),
            other => panic!("expected FloatRejected, got {other:?}"),
        }
    }

    #[test]
    fn deeply_nested_float_is_rejected() {
        let data = serde_json::json!({"a": [{"b": {"c": 0.5}}]});
        assert!(CanonicalBytes::new(&data).is_err());
    }

    #[test]
    fn integers_pass_through() {
        let data = serde_json::json!({"nonce": 1_048_576, "index": -1});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(cb.as_str(), r#"{"index":-1,"nonce":1048576}"#);
    }

    #[test]
    fn unicode_is_emitted_verbatim() {
        let data = serde_json::json!({"subject": "Zoë Ångström"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert!(cb.as_str().contains("Zoë Ångström"));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(CanonicalBytes::new(&serde_json::json!({})).unwrap().as_bytes(), b"{}");
        assert_eq!(CanonicalBytes::new(&serde_json::json!([])).unwrap().as_bytes(), b"[]");
        assert!(!CanonicalBytes::new(&serde_json::json!({})).unwrap().is_empty());
    }
}
