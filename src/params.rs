//! Protocol parameters and the wire encoding of public keys.
//!
//! A [`ProtocolParams`] value is a fixed, versioned bundle of choices that
//! both parties must share byte-for-byte; diverging parameters make key
//! derivation diverge silently, so a negotiated session must never mutate
//! them.
//!
//! Wire encodings (binary, no padding):
//!
//! - EC public key:  `curve tag (1 byte) ‖ key bytes`
//! - KEM public key: `kem tag (1 byte) ‖ key bytes`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::hybrid::{HashAlg, HybridMode};
use crate::crypto::kem::KemVariant;
use crate::error::{PqxdhError, Result};

/// Version label for the current parameter layout
pub const PROTOCOL_VERSION: &str = "pqxdh-v1";

/// Elliptic curve selector for the classical half of the agreement
///
/// Only curve25519 is implemented; curve448 is recognized on the wire but
/// every operation on it fails with `UnsupportedCurve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Curve25519,
    Curve448,
}

impl Curve {
    /// Public key size in bytes
    pub const fn public_key_len(self) -> usize {
        match self {
            Curve::Curve25519 => 32,
            Curve::Curve448 => 56,
        }
    }

    /// One-byte tag used in the wire encoding of EC public keys
    pub const fn wire_tag(self) -> u8 {
        match self {
            Curve::Curve25519 => 0x01,
            Curve::Curve448 => 0x02,
        }
    }

    /// Reverse of [`Curve::wire_tag`]
    pub fn from_wire_tag(tag: u8) -> Result<Self> {
        match tag {
            0x01 => Ok(Curve::Curve25519),
            0x02 => Ok(Curve::Curve448),
            other => Err(PqxdhError::UnsupportedCurve(format!("tag 0x{other:02x}"))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Curve::Curve25519 => "curve25519",
            Curve::Curve448 => "curve448",
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Curve {
    type Err = PqxdhError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "curve25519" => Ok(Curve::Curve25519),
            "curve448" => Ok(Curve::Curve448),
            other => Err(PqxdhError::UnsupportedCurve(other.to_string())),
        }
    }
}

/// Immutable protocol parameter bundle
///
/// `key_length` is the output size of the `hkdf` hybrid mode; `concat` and
/// `xor` always produce one digest of `hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    pub curve: Curve,
    pub hash: HashAlg,
    pub kem: KemVariant,
    pub hybrid_mode: HybridMode,
    pub key_length: usize,
}

impl ProtocolParams {
    /// Default v1 parameters: curve25519, SHA-256, ml-kem-768, hkdf, 32-byte
    /// session secret
    pub fn v1() -> Self {
        ProtocolParams {
            curve: Curve::Curve25519,
            hash: HashAlg::Sha256,
            kem: KemVariant::MlKem768,
            hybrid_mode: HybridMode::Hkdf,
            key_length: 32,
        }
    }

    /// Encode an EC public key as `curve tag ‖ key`
    pub fn encode_ec_public(&self, key: &[u8]) -> Result<Vec<u8>> {
        let expected = self.curve.public_key_len();
        if key.len() != expected {
            return Err(PqxdhError::InvalidKeyLength {
                expected,
                actual: key.len(),
            });
        }

        let mut out = Vec::with_capacity(1 + key.len());
        out.push(self.curve.wire_tag());
        out.extend_from_slice(key);
        Ok(out)
    }

    /// Decode a tagged EC public key, validating the length the tag implies
    pub fn decode_ec_public(&self, bytes: &[u8]) -> Result<(Curve, Vec<u8>)> {
        let Some((&tag, key)) = bytes.split_first() else {
            return Err(PqxdhError::InvalidKeyLength {
                expected: 1 + self.curve.public_key_len(),
                actual: bytes.len(),
            });
        };

        let curve = Curve::from_wire_tag(tag)?;
        if key.len() != curve.public_key_len() {
            return Err(PqxdhError::InvalidKeyLength {
                expected: curve.public_key_len(),
                actual: key.len(),
            });
        }

        Ok((curve, key.to_vec()))
    }

    /// Encode a KEM public key as `kem tag ‖ key`
    pub fn encode_kem_public(&self, key: &[u8]) -> Result<Vec<u8>> {
        let expected = self.kem.public_key_len();
        if key.len() != expected {
            return Err(PqxdhError::InvalidKeyLength {
                expected,
                actual: key.len(),
            });
        }

        let mut out = Vec::with_capacity(1 + key.len());
        out.push(self.kem.wire_tag());
        out.extend_from_slice(key);
        Ok(out)
    }

    /// Decode a tagged KEM public key, validating the length the tag implies
    pub fn decode_kem_public(&self, bytes: &[u8]) -> Result<(KemVariant, Vec<u8>)> {
        let Some((&tag, key)) = bytes.split_first() else {
            return Err(PqxdhError::InvalidKeyLength {
                expected: 1 + self.kem.public_key_len(),
                actual: bytes.len(),
            });
        };

        let variant = KemVariant::from_wire_tag(tag)?;
        if key.len() != variant.public_key_len() {
            return Err(PqxdhError::InvalidKeyLength {
                expected: variant.public_key_len(),
                actual: key.len(),
            });
        }

        Ok((variant, key.to_vec()))
    }
}
