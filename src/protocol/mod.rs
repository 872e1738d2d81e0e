//! Top-level key agreement entry points.
//!
//! `encapsulate` runs the initiator side, `decapsulate` the responder
//! side. Both are stateless, synchronous, CPU-bound functions over byte
//! buffers: every call supplies its own key material and may run
//! concurrently with any other. Intermediate component secrets are erased
//! before either function returns, on success and on every error path.

use log::debug;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::hybrid;
use crate::crypto::kem;
use crate::crypto::key_exchange;
use crate::crypto::secure_erase::secure_erase;
use crate::error::{PqxdhError, Result};
use crate::keys::PreKeyId;
use crate::params::ProtocolParams;

/// The recipient's published public keys an initiator encapsulates against
#[derive(Debug, Clone)]
pub struct RecipientPublicKeys {
    /// X25519 public key (32 bytes)
    pub ecc: Vec<u8>,
    /// ML-KEM encapsulation key (variant-length)
    pub pqkem: Vec<u8>,
}

/// The recipient's private keys used to recover the session secret.
/// Both halves are zeroized on drop.
pub struct RecipientPrivateKeys {
    /// X25519 private key (32 bytes)
    pub ecc_private: Vec<u8>,
    /// ML-KEM decapsulation key (variant-length)
    pub pqkem_private: Vec<u8>,
}

impl Drop for RecipientPrivateKeys {
    fn drop(&mut self) {
        self.ecc_private.zeroize();
        self.pqkem_private.zeroize();
    }
}

/// Initiator-side output of a successful key agreement
///
/// `shared_secret` is owned exclusively by the caller, who must erase it
/// (e.g. with [`secure_erase`]) once it has been fed into a session KDF.
#[derive(Debug, Clone)]
pub struct EncapsulationResult {
    /// KEM ciphertext to transmit to the recipient
    pub ciphertext: Vec<u8>,
    /// Derived hybrid session secret
    pub shared_secret: Vec<u8>,
    /// Ephemeral X25519 public key to transmit to the recipient
    pub ephemeral_public: [u8; 32],
}

/// Prekey bundle published to the directory collaborator
///
/// Public keys are in their tagged wire encoding; ids are opaque tokens
/// the directory uses for atomic fetch-and-consume bookkeeping; signature
/// fields are produced and verified by the signing collaborator and pass
/// through this core untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreKeyBundle {
    pub identity_key: Vec<u8>,
    pub signed_prekey: Vec<u8>,
    pub signed_prekey_id: PreKeyId,
    pub signed_prekey_signature: Vec<u8>,
    pub one_time_prekey: Option<Vec<u8>>,
    pub one_time_prekey_id: Option<PreKeyId>,
    pub pq_prekey: Vec<u8>,
    pub pq_prekey_id: PreKeyId,
    pub pq_prekey_signature: Vec<u8>,
}

impl PreKeyBundle {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PqxdhError::BundleEncoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| PqxdhError::BundleDecoding(e.to_string()))
    }
}

/// Initiator side: derive a hybrid session secret for the recipient
///
/// Steps: use (or generate) an ephemeral X25519 private key, run ECDH
/// against the recipient's EC key, encapsulate against the recipient's
/// KEM key, combine both component secrets per `params.hybrid_mode`, and
/// erase the components.
///
/// `ephemeral_private` is primarily for deterministic tests; production
/// callers pass `None` for a fresh random key.
pub fn encapsulate(
    params: &ProtocolParams,
    recipient: &RecipientPublicKeys,
    ephemeral_private: Option<[u8; 32]>,
) -> Result<EncapsulationResult> {
    debug!(
        "encapsulate: curve={}, kem={}, mode={}",
        params.curve, params.kem, params.hybrid_mode
    );

    let mut eph_private = match ephemeral_private {
        Some(key) => key,
        None => key_exchange::generate_keypair().1,
    };

    let result = encapsulate_with(params, recipient, &eph_private);
    eph_private.zeroize();
    result
}

fn encapsulate_with(
    params: &ProtocolParams,
    recipient: &RecipientPublicKeys,
    eph_private: &[u8; 32],
) -> Result<EncapsulationResult> {
    let ephemeral_public = key_exchange::derive_public_key(eph_private)?;

    let mut ecc_secret = key_exchange::compute_shared_secret(eph_private, &recipient.ecc)?;

    let (mut pq_secret, ciphertext) = match kem::encapsulate(params.kem, &recipient.pqkem) {
        Ok(out) => out,
        Err(err) => {
            secure_erase(&mut ecc_secret);
            return Err(err);
        }
    };

    let shared = hybrid::derive_shared_secret(params, &ecc_secret, &pq_secret);
    secure_erase(&mut ecc_secret);
    secure_erase(&mut pq_secret);

    Ok(EncapsulationResult {
        ciphertext,
        shared_secret: shared?,
        ephemeral_public,
    })
}

/// Responder side: recover the hybrid session secret from a ciphertext
///
/// Validates ciphertext and KEM private-key lengths against the configured
/// variant before touching any key material; parameters must be
/// byte-identical to the encapsulating side or derivation diverges.
/// The returned secret equals the initiator's byte-for-byte and is owned
/// by the caller, who must erase it once consumed.
pub fn decapsulate(
    params: &ProtocolParams,
    ciphertext: &[u8],
    recipient: &RecipientPrivateKeys,
    sender_ephemeral_public: &[u8],
) -> Result<Vec<u8>> {
    debug!(
        "decapsulate: curve={}, kem={}, mode={}",
        params.curve, params.kem, params.hybrid_mode
    );

    kem::validate_decapsulation_inputs(
        params.kem,
        ciphertext.len(),
        recipient.pqkem_private.len(),
    )?;

    let mut ecc_secret =
        key_exchange::compute_shared_secret(&recipient.ecc_private, sender_ephemeral_public)?;

    let mut pq_secret = match kem::decapsulate(params.kem, ciphertext, &recipient.pqkem_private) {
        Ok(secret) => secret,
        Err(err) => {
            secure_erase(&mut ecc_secret);
            return Err(err);
        }
    };

    let shared = hybrid::derive_shared_secret(params, &ecc_secret, &pq_secret);
    secure_erase(&mut ecc_secret);
    secure_erase(&mut pq_secret);

    shared
}
