//! ML-KEM key encapsulation (NIST FIPS 203).
//!
//! The post-quantum half of the hybrid key agreement. All three parameter
//! sets are supported behind a single [`KemVariant`] selector; the fixed
//! byte lengths below are part of the wire contract and every input is
//! validated against them before the underlying KEM is invoked.
//!
//! Key sizes:
//!
//! | Variant     | public | secret | ciphertext |
//! |-------------|--------|--------|------------|
//! | ml-kem-512  |    800 |   1632 |        768 |
//! | ml-kem-768  |   1184 |   2400 |       1088 |
//! | ml-kem-1024 |   1568 |   3168 |       1568 |

use std::fmt;
use std::str::FromStr;

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{Encoded, EncodedSizeUser, KemCore, MlKem1024, MlKem512, MlKem768};
use rand::rngs::OsRng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{PqxdhError, Result};

/// Shared secret size in bytes (identical for all ML-KEM parameter sets)
pub const KEM_SHARED_SECRET_BYTES: usize = 32;

/// ML-KEM parameter set selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KemVariant {
    #[serde(rename = "ml-kem-512")]
    MlKem512,
    #[serde(rename = "ml-kem-768")]
    MlKem768,
    #[serde(rename = "ml-kem-1024")]
    MlKem1024,
}

impl KemVariant {
    /// Encapsulation key (public) size in bytes
    pub const fn public_key_len(self) -> usize {
        match self {
            KemVariant::MlKem512 => 800,
            KemVariant::MlKem768 => 1184,
            KemVariant::MlKem1024 => 1568,
        }
    }

    /// Decapsulation key (secret) size in bytes
    pub const fn secret_key_len(self) -> usize {
        match self {
            KemVariant::MlKem512 => 1632,
            KemVariant::MlKem768 => 2400,
            KemVariant::MlKem1024 => 3168,
        }
    }

    /// Ciphertext size in bytes
    pub const fn ciphertext_len(self) -> usize {
        match self {
            KemVariant::MlKem512 => 768,
            KemVariant::MlKem768 => 1088,
            KemVariant::MlKem1024 => 1568,
        }
    }

    /// One-byte tag used in the wire encoding of KEM public keys
    pub const fn wire_tag(self) -> u8 {
        match self {
            KemVariant::MlKem512 => 0x01,
            KemVariant::MlKem768 => 0x02,
            KemVariant::MlKem1024 => 0x03,
        }
    }

    /// Reverse of [`KemVariant::wire_tag`]
    pub fn from_wire_tag(tag: u8) -> Result<Self> {
        match tag {
            0x01 => Ok(KemVariant::MlKem512),
            0x02 => Ok(KemVariant::MlKem768),
            0x03 => Ok(KemVariant::MlKem1024),
            other => Err(PqxdhError::UnsupportedKem(format!("tag 0x{other:02x}"))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            KemVariant::MlKem512 => "ml-kem-512",
            KemVariant::MlKem768 => "ml-kem-768",
            KemVariant::MlKem1024 => "ml-kem-1024",
        }
    }
}

impl fmt::Display for KemVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KemVariant {
    type Err = PqxdhError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ml-kem-512" => Ok(KemVariant::MlKem512),
            "ml-kem-768" => Ok(KemVariant::MlKem768),
            "ml-kem-1024" => Ok(KemVariant::MlKem1024),
            other => Err(PqxdhError::UnsupportedKem(other.to_string())),
        }
    }
}

/// ML-KEM keypair. The decapsulation key is zeroized on drop.
#[derive(Clone)]
pub struct KemKeyPair {
    pub variant: KemVariant,
    /// Encapsulation key (public)
    pub public: Vec<u8>,
    /// Decapsulation key (secret)
    pub secret: Vec<u8>,
}

impl Drop for KemKeyPair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl fmt::Debug for KemKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KemKeyPair({}, public={}..[{}B], secret=[{}B])",
            self.variant,
            hex::encode(&self.public[..4.min(self.public.len())]),
            self.public.len(),
            self.secret.len(),
        )
    }
}

/// Generate a fresh ML-KEM keypair for the given variant
///
/// Always invokes the real FIPS 203 key generation; key buffers are never
/// substituted with plain randomness.
pub fn keygen(variant: KemVariant) -> KemKeyPair {
    let (public, secret) = match variant {
        KemVariant::MlKem512 => keygen_inner::<MlKem512>(&mut OsRng),
        KemVariant::MlKem768 => keygen_inner::<MlKem768>(&mut OsRng),
        KemVariant::MlKem1024 => keygen_inner::<MlKem1024>(&mut OsRng),
    };

    KemKeyPair {
        variant,
        public,
        secret,
    }
}

/// Generate an ML-KEM keypair deterministically from a 32-byte seed
pub fn keygen_from_seed(variant: KemVariant, seed: &[u8; 32]) -> KemKeyPair {
    let mut rng = ChaCha20Rng::from_seed(*seed);

    let (public, secret) = match variant {
        KemVariant::MlKem512 => keygen_inner::<MlKem512>(&mut rng),
        KemVariant::MlKem768 => keygen_inner::<MlKem768>(&mut rng),
        KemVariant::MlKem1024 => keygen_inner::<MlKem1024>(&mut rng),
    };

    KemKeyPair {
        variant,
        public,
        secret,
    }
}

/// Encapsulate against an encapsulation key using fresh internal randomness
///
/// # Returns
/// (shared_secret, ciphertext) - 32-byte shared secret plus a
/// variant-length ciphertext only the matching secret key can open.
///
/// # Errors
/// `InvalidLength` if the public key does not match the variant's fixed
/// length.
pub fn encapsulate(variant: KemVariant, public_key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    if public_key.len() != variant.public_key_len() {
        return Err(PqxdhError::InvalidLength {
            kem: variant,
            field: "public key",
            expected: variant.public_key_len(),
            actual: public_key.len(),
        });
    }

    match variant {
        KemVariant::MlKem512 => encapsulate_inner::<MlKem512>(public_key),
        KemVariant::MlKem768 => encapsulate_inner::<MlKem768>(public_key),
        KemVariant::MlKem1024 => encapsulate_inner::<MlKem1024>(public_key),
    }
}

/// Recover the shared secret from a ciphertext
///
/// Both input lengths are checked against the variant table before any KEM
/// code runs; malformed input never reaches decapsulation.
pub fn decapsulate(variant: KemVariant, ciphertext: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
    validate_decapsulation_inputs(variant, ciphertext.len(), secret_key.len())?;

    match variant {
        KemVariant::MlKem512 => decapsulate_inner::<MlKem512>(ciphertext, secret_key),
        KemVariant::MlKem768 => decapsulate_inner::<MlKem768>(ciphertext, secret_key),
        KemVariant::MlKem1024 => decapsulate_inner::<MlKem1024>(ciphertext, secret_key),
    }
}

/// Length validation shared by [`decapsulate`] and the top-level protocol
pub fn validate_decapsulation_inputs(
    variant: KemVariant,
    ciphertext_len: usize,
    secret_key_len: usize,
) -> Result<()> {
    if ciphertext_len != variant.ciphertext_len() {
        return Err(PqxdhError::InvalidLength {
            kem: variant,
            field: "ciphertext",
            expected: variant.ciphertext_len(),
            actual: ciphertext_len,
        });
    }

    if secret_key_len != variant.secret_key_len() {
        return Err(PqxdhError::InvalidLength {
            kem: variant,
            field: "secret key",
            expected: variant.secret_key_len(),
            actual: secret_key_len,
        });
    }

    Ok(())
}

fn keygen_inner<K: KemCore>(rng: &mut impl CryptoRngCore) -> (Vec<u8>, Vec<u8>) {
    let (dk, ek) = K::generate(rng);
    (ek.as_bytes().to_vec(), dk.as_bytes().to_vec())
}

fn encapsulate_inner<K: KemCore>(public_key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let ek_encoded = Encoded::<K::EncapsulationKey>::try_from(public_key)
        .map_err(|_| PqxdhError::EncapsulationFailed)?;
    let ek = <K::EncapsulationKey as EncodedSizeUser>::from_bytes(&ek_encoded);

    let (ct, ss) = ek
        .encapsulate(&mut OsRng)
        .map_err(|_| PqxdhError::EncapsulationFailed)?;

    Ok((ss.to_vec(), ct.to_vec()))
}

fn decapsulate_inner<K: KemCore>(ciphertext: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
    let dk_encoded = Encoded::<K::DecapsulationKey>::try_from(secret_key)
        .map_err(|_| PqxdhError::DecapsulationFailed)?;
    let dk = <K::DecapsulationKey as EncodedSizeUser>::from_bytes(&dk_encoded);

    let ct = ml_kem::Ciphertext::<K>::try_from(ciphertext)
        .map_err(|_| PqxdhError::DecapsulationFailed)?;

    let ss = dk
        .decapsulate(&ct)
        .map_err(|_| PqxdhError::DecapsulationFailed)?;

    Ok(ss.to_vec())
}
