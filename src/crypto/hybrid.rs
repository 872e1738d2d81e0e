//! Hybrid secret derivation.
//!
//! Merges the X25519 shared secret and the ML-KEM shared secret into a
//! single session secret. The combined key is secure as long as either
//! underlying primitive remains unbroken.
//!
//! Three combination strategies are supported:
//!
//! - `concat`: `Hash(ecc ‖ pq)`; simplest, no domain separation.
//! - `xor`: `Hash(ecc ⊕ pq)`; requires equal-length operands, and is
//!   only sound when both operand distributions carry comparable entropy.
//! - `hkdf`: `HKDF-Expand(Hash(ecc ‖ pq), "hybrid-kem-v1")`; the
//!   recommended default, with explicit domain separation against
//!   cross-protocol key reuse.
//!
//! Derivation is fully deterministic: both parties reach identical bytes
//! from identical inputs and parameters.

use std::fmt;
use std::str::FromStr;

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroize;

use crate::error::{PqxdhError, Result};
use crate::params::ProtocolParams;

/// Domain-separation context for the `hkdf` mode
const HKDF_INFO: &[u8] = b"hybrid-kem-v1";

/// Strategy for combining the classical and post-quantum shared secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HybridMode {
    Concat,
    Xor,
    Hkdf,
}

impl HybridMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            HybridMode::Concat => "concat",
            HybridMode::Xor => "xor",
            HybridMode::Hkdf => "hkdf",
        }
    }
}

impl fmt::Display for HybridMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HybridMode {
    type Err = PqxdhError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "concat" => Ok(HybridMode::Concat),
            "xor" => Ok(HybridMode::Xor),
            "hkdf" => Ok(HybridMode::Hkdf),
            other => Err(PqxdhError::InvalidMode(other.to_string())),
        }
    }
}

/// Hash primitive underlying all three combination modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlg {
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl HashAlg {
    /// Digest size in bytes
    pub const fn digest_len(self) -> usize {
        match self {
            HashAlg::Sha256 => 32,
            HashAlg::Sha512 => 64,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            HashAlg::Sha256 => "SHA-256",
            HashAlg::Sha512 => "SHA-512",
        }
    }
}

impl fmt::Display for HashAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the hybrid session secret from the two component secrets
///
/// Dispatches on `params.hybrid_mode`; see the module docs for the exact
/// construction per mode. `concat` and `xor` produce a digest-length
/// output; `hkdf` produces `params.key_length` bytes.
///
/// # Errors
/// `KeyLengthMismatch` in `xor` mode when operand lengths differ;
/// `KdfExpandFailed` if the requested `hkdf` output length exceeds what a
/// single HKDF invocation can produce.
pub fn derive_shared_secret(
    params: &ProtocolParams,
    ecc_secret: &[u8],
    pq_secret: &[u8],
) -> Result<Vec<u8>> {
    match params.hybrid_mode {
        HybridMode::Concat => Ok(hash_concat(params.hash, ecc_secret, pq_secret)),
        HybridMode::Xor => {
            if ecc_secret.len() != pq_secret.len() {
                return Err(PqxdhError::KeyLengthMismatch {
                    ecc: ecc_secret.len(),
                    pq: pq_secret.len(),
                });
            }

            let mut combined: Vec<u8> = ecc_secret
                .iter()
                .zip(pq_secret.iter())
                .map(|(a, b)| a ^ b)
                .collect();
            let digest = hash_bytes(params.hash, &combined);
            combined.zeroize();

            Ok(digest)
        }
        HybridMode::Hkdf => {
            let mut prk = hash_concat(params.hash, ecc_secret, pq_secret);
            let expanded = hkdf_expand(params.hash, &prk, params.key_length);
            prk.zeroize();

            expanded
        }
    }
}

fn hash_concat(hash: HashAlg, a: &[u8], b: &[u8]) -> Vec<u8> {
    match hash {
        HashAlg::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(a);
            hasher.update(b);
            hasher.finalize().to_vec()
        }
        HashAlg::Sha512 => {
            let mut hasher = Sha512::new();
            hasher.update(a);
            hasher.update(b);
            hasher.finalize().to_vec()
        }
    }
}

fn hash_bytes(hash: HashAlg, data: &[u8]) -> Vec<u8> {
    match hash {
        HashAlg::Sha256 => Sha256::digest(data).to_vec(),
        HashAlg::Sha512 => Sha512::digest(data).to_vec(),
    }
}

fn hkdf_expand(hash: HashAlg, prk: &[u8], length: usize) -> Result<Vec<u8>> {
    let mut output = vec![0u8; length];

    match hash {
        HashAlg::Sha256 => {
            let hk = Hkdf::<Sha256>::from_prk(prk).map_err(|_| PqxdhError::KdfExpandFailed)?;
            hk.expand(HKDF_INFO, &mut output)
                .map_err(|_| PqxdhError::KdfExpandFailed)?;
        }
        HashAlg::Sha512 => {
            let hk = Hkdf::<Sha512>::from_prk(prk).map_err(|_| PqxdhError::KdfExpandFailed)?;
            hk.expand(HKDF_INFO, &mut output)
                .map_err(|_| PqxdhError::KdfExpandFailed)?;
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::crypto::kem::KemVariant;
    use crate::params::Curve;

    fn params_with_mode(mode: HybridMode) -> ProtocolParams {
        ProtocolParams {
            curve: Curve::Curve25519,
            hash: HashAlg::Sha256,
            kem: KemVariant::MlKem768,
            hybrid_mode: mode,
            key_length: 32,
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let ecc = [1u8; 32];
        let pq = [2u8; 32];

        for mode in [HybridMode::Concat, HybridMode::Xor, HybridMode::Hkdf] {
            let params = params_with_mode(mode);
            let first = derive_shared_secret(&params, &ecc, &pq).unwrap();
            let second = derive_shared_secret(&params, &ecc, &pq).unwrap();
            assert_eq!(first, second, "{mode} must be deterministic");
        }
    }

    #[test]
    fn test_modes_diverge_on_identical_inputs() {
        let ecc = [1u8; 32];
        let pq = [2u8; 32];

        let concat =
            derive_shared_secret(&params_with_mode(HybridMode::Concat), &ecc, &pq).unwrap();
        let xor = derive_shared_secret(&params_with_mode(HybridMode::Xor), &ecc, &pq).unwrap();
        let hkdf = derive_shared_secret(&params_with_mode(HybridMode::Hkdf), &ecc, &pq).unwrap();

        assert_ne!(concat, xor);
        assert_ne!(concat, hkdf);
        assert_ne!(xor, hkdf);
    }

    #[test]
    fn test_xor_rejects_unequal_lengths() {
        let params = params_with_mode(HybridMode::Xor);
        let err = derive_shared_secret(&params, &[1u8; 32], &[2u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            PqxdhError::KeyLengthMismatch { ecc: 32, pq: 16 }
        ));
    }

    #[test]
    fn test_output_lengths_follow_hash_and_key_length() {
        let ecc = [3u8; 32];
        let pq = [4u8; 32];

        let mut params = params_with_mode(HybridMode::Concat);
        assert_eq!(derive_shared_secret(&params, &ecc, &pq).unwrap().len(), 32);

        params.hash = HashAlg::Sha512;
        assert_eq!(derive_shared_secret(&params, &ecc, &pq).unwrap().len(), 64);

        params.hybrid_mode = HybridMode::Hkdf;
        params.key_length = 48;
        assert_eq!(derive_shared_secret(&params, &ecc, &pq).unwrap().len(), 48);
    }

    #[test]
    fn test_hash_choice_changes_output() {
        let ecc = [5u8; 32];
        let pq = [6u8; 32];

        let sha256 = derive_shared_secret(&params_with_mode(HybridMode::Hkdf), &ecc, &pq).unwrap();

        let mut params = params_with_mode(HybridMode::Hkdf);
        params.hash = HashAlg::Sha512;
        let sha512 = derive_shared_secret(&params, &ecc, &pq).unwrap();

        assert_ne!(sha256, sha512);
    }

    #[test]
    fn test_fixed_vectors_per_mode() {
        // SHA-256 over fixed 32-byte operands; independently computed.
        let ecc = [0x01u8; 32];
        let pq = [0x02u8; 32];

        let concat =
            derive_shared_secret(&params_with_mode(HybridMode::Concat), &ecc, &pq).unwrap();
        assert_eq!(
            concat,
            hex!("f818afd37a6dc3bc92fb44731011277006db4efa6e9023cd7468c02335d22a4d")
        );

        let xor = derive_shared_secret(&params_with_mode(HybridMode::Xor), &ecc, &pq).unwrap();
        assert_eq!(
            xor,
            hex!("648aa5c579fb30f38af744d97d6ec840c7a91277a499a0d780f3e7314eca090b")
        );

        let hkdf = derive_shared_secret(&params_with_mode(HybridMode::Hkdf), &ecc, &pq).unwrap();
        assert_eq!(
            hkdf,
            hex!("16e41965e71f894991d589300c6ac6374253a3ba1acd15b124bf7d77b7c72ef7")
        );
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("hkdf".parse::<HybridMode>().unwrap(), HybridMode::Hkdf);
        assert!(matches!(
            "blend".parse::<HybridMode>(),
            Err(PqxdhError::InvalidMode(_))
        ));
    }
}
