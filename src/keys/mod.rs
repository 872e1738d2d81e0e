//! Key material generation and lifecycle types.
//!
//! Produces the asymmetric keys the protocol consumes: a long-lived
//! identity keypair, a rotatable signed prekey, single-use one-time
//! prekeys, and their post-quantum counterparts. Every prekey carries an
//! opaque id used by the directory collaborator for bundle lookup and
//! consumption tracking.
//!
//! Secret halves of all key types are zeroized on drop. One-time prekeys
//! must be consumed exactly once; the atomic consumption ledger lives in
//! [`KeyStore`].

mod store;

use std::fmt;

use base64::Engine;
use log::debug;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::crypto::kem::{self, KemKeyPair, KemVariant};
use crate::crypto::key_exchange;
use crate::error::{PqxdhError, Result};
use crate::params::{Curve, ProtocolParams};

pub use store::KeyStore;

/// X25519 keypair. The secret half is zeroized on drop.
#[derive(Clone)]
pub struct EcKeyPair {
    pub public: [u8; 32],
    pub secret: [u8; 32],
}

impl Drop for EcKeyPair {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl fmt::Debug for EcKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcKeyPair(public={})", hex::encode(self.public))
    }
}

/// Opaque prekey identifier: base64 of 16 random bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreKeyId(String);

impl PreKeyId {
    pub fn generate() -> Self {
        let mut raw = [0u8; 16];
        OsRng.fill_bytes(&mut raw);
        PreKeyId(base64::engine::general_purpose::STANDARD.encode(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Medium-lived EC prekey, rotated periodically by the caller.
///
/// Conceptually signed by the identity key; signature production and
/// verification belong to a collaborator, and the signature bytes travel
/// opaquely in the prekey bundle.
#[derive(Debug, Clone)]
pub struct SignedPreKey {
    pub id: PreKeyId,
    pub key: EcKeyPair,
}

/// Single-use EC prekey. Never reused after first successful consumption.
#[derive(Debug, Clone)]
pub struct OneTimePreKey {
    pub id: PreKeyId,
    pub key: EcKeyPair,
}

/// Medium-lived KEM prekey, rotated periodically by the caller
#[derive(Debug, Clone)]
pub struct PqSignedPreKey {
    pub id: PreKeyId,
    pub key: KemKeyPair,
}

/// Single-use KEM prekey
#[derive(Debug, Clone)]
pub struct PqOneTimePreKey {
    pub id: PreKeyId,
    pub key: KemKeyPair,
}

/// Key material held by the initiating party
#[derive(Debug)]
pub struct SenderKeys {
    /// Long-lived identity keypair
    pub identity: EcKeyPair,
    /// Fresh ephemeral keypair for a single session establishment
    pub ephemeral: EcKeyPair,
}

/// The full prekey set a responder generates before publishing a bundle
#[derive(Debug)]
pub struct ReceiverKeys {
    pub identity: EcKeyPair,
    pub signed_prekey: SignedPreKey,
    pub one_time_prekey: OneTimePreKey,
    pub pq_signed_prekey: PqSignedPreKey,
    pub pq_one_time_prekey: PqOneTimePreKey,
}

/// Generate an EC keypair for the given curve
///
/// # Errors
/// `UnsupportedCurve` for anything other than curve25519; there is no
/// silent fallback.
pub fn generate_ec_keypair(curve: Curve) -> Result<EcKeyPair> {
    match curve {
        Curve::Curve25519 => {
            let (public, secret) = key_exchange::generate_keypair();
            Ok(EcKeyPair { public, secret })
        }
        Curve::Curve448 => Err(PqxdhError::UnsupportedCurve(curve.as_str().to_string())),
    }
}

/// Build an EC keypair deterministically from a 32-byte seed
pub fn ec_keypair_from_seed(seed: &[u8; 32]) -> EcKeyPair {
    let (public, secret) = key_exchange::keypair_from_seed(seed);
    EcKeyPair { public, secret }
}

/// Generate a KEM keypair sized for the given variant
///
/// Always runs the real ML-KEM key generation. Filling key buffers with
/// plain randomness would produce undecapsulatable garbage and must never
/// be substituted here.
pub fn generate_kem_keypair(kem: KemVariant) -> KemKeyPair {
    kem::keygen(kem)
}

/// Build a KEM keypair deterministically from a 32-byte seed
///
/// The KEM seed is domain-separated from the caller's master seed with
/// SHA-256 over `seed ‖ variant-name`, so EC and KEM keys derived from one
/// master seed stay independent.
pub fn kem_keypair_from_seed(kem: KemVariant, seed: &[u8; 32]) -> KemKeyPair {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(kem.as_str().as_bytes());
    let mut derived: [u8; 32] = hasher.finalize().into();

    let keypair = kem::keygen_from_seed(kem, &derived);
    derived.zeroize();
    keypair
}

/// Create the initiator's key material: identity + ephemeral EC keypairs
pub fn create_sender_keys(params: &ProtocolParams) -> Result<SenderKeys> {
    Ok(SenderKeys {
        identity: generate_ec_keypair(params.curve)?,
        ephemeral: generate_ec_keypair(params.curve)?,
    })
}

/// Create the responder's full prekey set, each prekey with a fresh
/// opaque id
pub fn create_receiver_keys(params: &ProtocolParams) -> Result<ReceiverKeys> {
    debug!(
        "generating receiver keys: curve={}, kem={}",
        params.curve, params.kem
    );

    Ok(ReceiverKeys {
        identity: generate_ec_keypair(params.curve)?,
        signed_prekey: SignedPreKey {
            id: PreKeyId::generate(),
            key: generate_ec_keypair(params.curve)?,
        },
        one_time_prekey: OneTimePreKey {
            id: PreKeyId::generate(),
            key: generate_ec_keypair(params.curve)?,
        },
        pq_signed_prekey: PqSignedPreKey {
            id: PreKeyId::generate(),
            key: generate_kem_keypair(params.kem),
        },
        pq_one_time_prekey: PqOneTimePreKey {
            id: PreKeyId::generate(),
            key: generate_kem_keypair(params.kem),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve448_is_rejected() {
        let err = generate_ec_keypair(Curve::Curve448).unwrap_err();
        assert!(matches!(err, PqxdhError::UnsupportedCurve(_)));
    }

    #[test]
    fn test_receiver_keys_have_fixed_lengths() {
        let params = ProtocolParams::v1();
        let keys = create_receiver_keys(&params).unwrap();

        assert_eq!(keys.identity.public.len(), 32);
        assert_eq!(keys.identity.secret.len(), 32);
        assert_eq!(keys.pq_signed_prekey.key.public.len(), 1184);
        assert_eq!(keys.pq_signed_prekey.key.secret.len(), 2400);
        assert_eq!(keys.pq_one_time_prekey.key.public.len(), 1184);
        assert_eq!(keys.pq_one_time_prekey.key.secret.len(), 2400);
    }

    #[test]
    fn test_prekey_ids_are_unique() {
        let params = ProtocolParams::v1();
        let keys = create_receiver_keys(&params).unwrap();

        let ids = [
            &keys.signed_prekey.id,
            &keys.one_time_prekey.id,
            &keys.pq_signed_prekey.id,
            &keys.pq_one_time_prekey.id,
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_prekey_id_is_base64_of_16_bytes() {
        let id = PreKeyId::generate();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(id.as_str())
            .unwrap();
        assert_eq!(decoded.len(), 16);
    }

    #[test]
    fn test_seeded_keypairs_are_deterministic_and_domain_separated() {
        let seed = [11u8; 32];

        let ec1 = ec_keypair_from_seed(&seed);
        let ec2 = ec_keypair_from_seed(&seed);
        assert_eq!(ec1.public, ec2.public);

        let kem1 = kem_keypair_from_seed(KemVariant::MlKem512, &seed);
        let kem2 = kem_keypair_from_seed(KemVariant::MlKem512, &seed);
        assert_eq!(kem1.public, kem2.public);
        assert_eq!(kem1.secret, kem2.secret);

        // Different variants under the same master seed diverge
        let kem768 = kem_keypair_from_seed(KemVariant::MlKem768, &seed);
        assert_ne!(kem1.public, kem768.public[..kem1.public.len()].to_vec());
    }

    #[test]
    fn test_sender_keys_distinct() {
        let params = ProtocolParams::v1();
        let keys = create_sender_keys(&params).unwrap();
        assert_ne!(keys.identity.public, keys.ephemeral.public);
    }
}
