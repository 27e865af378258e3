//! # RSA Wallets
//!
//! A [`Wallet`] binds an owner identity to an RSA-2048 keypair.
//!
//! ## Security Invariant
//!
//! - Signing input MUST be `&CanonicalBytes`. A certificate signed from a
//!   hand-built string would fail verification everywhere else.
//! - `Wallet` does not implement `Serialize`, and its `Debug` output names
//!   the owner and address only.
//!
//! ## Serde
//!
//! - Public keys serialize as PEM strings.
//! - Signatures serialize as lowercase hex strings, full length.

use edl_core::{CanonicalBytes, CryptoError, IdentityId};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::WalletError;

/// RSA modulus size. The public exponent is the `rsa` crate default, 65537.
pub const KEY_BITS: usize = 2048;

/// Number of hex characters kept from the public key digest.
pub const ADDRESS_HEX_LEN: usize = 20;

/// An RSA public key, kept alongside its PEM encoding.
#[derive(Clone)]
pub struct WalletPublicKey {
    key: RsaPublicKey,
    pem: String,
}

/// Short display handle derived from a public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

/// An RSASSA-PSS signature.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RsaSignature(Vec<u8>);

/// An identity's signing wallet.
pub struct Wallet {
    owner: IdentityId,
    signing_key: BlindedSigningKey<Sha256>,
    public_key: WalletPublicKey,
    address: WalletAddress,
}

// ---------------------------------------------------------------------------
// WalletPublicKey
// ---------------------------------------------------------------------------

impl WalletPublicKey {
    fn from_key(key: RsaPublicKey) -> Result<Self, WalletError> {
        let pem = key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| WalletError::Encoding(e.to_string()))?;
        Ok(Self { key, pem })
    }

    /// Parse a PEM-encoded SubjectPublicKeyInfo.
    pub fn from_pem(pem: &str) -> Result<Self, WalletError> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| WalletError::Encoding(e.to_string()))?;
        Self::from_key(key)
    }

    pub fn to_pem(&self) -> &str {
        &self.pem
    }

    fn verifying_key(&self) -> VerifyingKey<Sha256> {
        VerifyingKey::new(self.key.clone())
    }
}

impl PartialEq for WalletPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.pem == other.pem
    }
}

impl Eq for WalletPublicKey {}

impl Serialize for WalletPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pem)
    }
}

impl<'de> Deserialize<'de> for WalletPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pem = String::deserialize(deserializer)?;
        Self::from_pem(&pem).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for WalletPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletPublicKey({})", derive_address(self))
    }
}

// ---------------------------------------------------------------------------
// WalletAddress
// ---------------------------------------------------------------------------

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the address for a public key: sha256 over the PEM text,
/// truncated to [`ADDRESS_HEX_LEN`] hex characters.
pub fn derive_address(public_key: &WalletPublicKey) -> WalletAddress {
    let digest = Sha256::digest(public_key.pem.as_bytes());
    let mut hex = to_hex(&digest);
    hex.truncate(ADDRESS_HEX_LEN);
    WalletAddress(hex)
}

// ---------------------------------------------------------------------------
// RsaSignature
// ---------------------------------------------------------------------------

impl RsaSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(hex.trim()).map_err(CryptoError::VerificationFailed)?;
        if bytes.is_empty() {
            return Err(CryptoError::VerificationFailed(
                "signature must not be empty".to_string(),
            ));
        }
        Ok(Self(bytes))
    }
}

impl Serialize for RsaSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RsaSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for RsaSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsaSignature({}...)", to_hex(&self.0[..self.0.len().min(4)]))
    }
}

impl std::fmt::Display for RsaSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

impl Wallet {
    /// Generate a fresh [`KEY_BITS`]-bit keypair for `owner`.
    pub fn generate(owner: IdentityId) -> Result<Self, WalletError> {
        let private_key =
            RsaPrivateKey::new(&mut OsRng, KEY_BITS).map_err(|e| WalletError::KeyGeneration {
                owner: owner.to_string(),
                reason: e.to_string(),
            })?;
        let public_key = WalletPublicKey::from_key(private_key.to_public_key())?;
        let address = derive_address(&public_key);
        Ok(Self {
            owner,
            signing_key: BlindedSigningKey::<Sha256>::new(private_key),
            public_key,
            address,
        })
    }

    pub fn owner(&self) -> &IdentityId {
        &self.owner
    }

    pub fn public_key(&self) -> &WalletPublicKey {
        &self.public_key
    }

    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    /// Sign canonical bytes with RSASSA-PSS.
    pub fn sign(&self, data: &CanonicalBytes) -> Result<RsaSignature, CryptoError> {
        let signature = self
            .signing_key
            .try_sign_with_rng(&mut OsRng, data.as_bytes())
            .map_err(|e| CryptoError::KeyError(format!("PSS signing failed: {e}")))?;
        Ok(RsaSignature(signature.to_bytes().into_vec()))
    }

    /// Verify a signature against this wallet's own public key.
    pub fn verify(&self, data: &CanonicalBytes, signature: &RsaSignature) -> Result<(), CryptoError> {
        verify_with_public_key(data, signature, &self.public_key)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("owner", &self.owner)
            .field("address", &self.address)
            .field("private_key", &"<private>")
            .finish()
    }
}

/// Verify an RSASSA-PSS signature over canonical bytes.
pub fn verify_with_public_key(
    data: &CanonicalBytes,
    signature: &RsaSignature,
    public_key: &WalletPublicKey,
) -> Result<(), CryptoError> {
    let sig = Signature::try_from(signature.as_bytes())
        .map_err(|e| CryptoError::VerificationFailed(format!("malformed signature: {e}")))?;
    public_key
        .verifying_key()
        .verify(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(format!("PSS verification failed: {e}")))
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .ok_or_else(|| format!("invalid hex at position {i}"))
                .and_then(|pair| {
                    u8::from_str_radix(pair, 16)
                        .map_err(|e| format!("invalid hex at position {i}: {e}"))
                })
        })
        .collect()
}
