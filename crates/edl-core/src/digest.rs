//! # Content Digests
//!
//! SHA-256 digests computed over `CanonicalBytes`. Block hashes, wallet
//! addresses and consent grant ids are all derived from these.
//!
//! `sha256_digest()` accepts only `&CanonicalBytes`, never raw `&[u8]`, so
//! every digest in the system has passed through canonicalization.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A 32-byte SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// The first `len` hex characters of the digest.
    ///
    /// Used for display handles (wallet addresses, grant ids). Truncated
    /// digests are not collision resistant and must never be used as
    /// authorization tokens.
    pub fn short_hex(&self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.min(64));
        hex
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Compute a SHA-256 digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}

/// Compute a SHA-256 hex string from canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

/// Count the leading `'0'` characters of a hex string.
///
/// This is the difficulty metric for block sealing: a hash meets
/// difficulty `d` when `leading_zero_nibbles(hash) >= d`.
pub fn leading_zero_nibbles(hex: &str) -> u32 {
    hex.bytes().take_while(|&b| b == b'0').count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector_for_empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_hex(&cb),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn digest_is_deterministic() {
        let cb = CanonicalBytes::new(&serde_json::json!({"type": "genesis"})).unwrap();
        assert_eq!(sha256_digest(&cb), sha256_digest(&cb));
    }

    #[test]
    fn different_inputs_different_digests() {
        let a = CanonicalBytes::new(&serde_json::json!({"nonce": 1})).unwrap();
        let b = CanonicalBytes::new(&serde_json::json!({"nonce": 2})).unwrap();
        assert_ne!(sha256_digest(&a), sha256_digest(&b));
    }

    #[test]
    fn hex_is_64_lowercase_chars() {
        let cb = CanonicalBytes::new(&serde_json::json!({"k": "v"})).unwrap();
        let hex = sha256_hex(&cb);
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn short_hex_truncates() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        let d = sha256_digest(&cb);
        assert_eq!(d.short_hex(20), "44136fa355b3678a1146");
        assert_eq!(d.short_hex(200).len(), 64);
    }

    #[test]
    fn leading_zeros() {
        assert_eq!(leading_zero_nibbles("00ab"), 2);
        assert_eq!(leading_zero_nibbles("000"), 3);
        assert_eq!(leading_zero_nibbles("a000"), 0);
        assert_eq!(leading_zero_nibbles(""), 0);
    }
}
