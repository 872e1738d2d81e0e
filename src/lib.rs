//! # PQXDH Core
//!
//! **Hybrid post-quantum key agreement: X25519 + ML-KEM.**
//!
//! A standalone key-agreement core in the PQXDH family: two parties with no
//! prior shared secret derive a common session key that stays secure as
//! long as *either* the classical or the post-quantum primitive remains
//! unbroken. This crate covers key generation, prekey management, the wire
//! encoding of public keys, and the `encapsulate`/`decapsulate` entry
//! points; session messaging (double ratchet), prekey-directory transport,
//! and signature production are external collaborators.
//!
//! ## Quick Start
//!
//! ```rust
//! use pqxdh_core::{create_receiver_keys, decapsulate, encapsulate, ProtocolParams};
//! use pqxdh_core::protocol::{RecipientPrivateKeys, RecipientPublicKeys};
//!
//! let params = ProtocolParams::v1();
//! let receiver = create_receiver_keys(&params).expect("keygen");
//!
//! // Initiator side: encapsulate against the published public keys
//! let recipient_public = RecipientPublicKeys {
//!     ecc: receiver.signed_prekey.key.public.to_vec(),
//!     pqkem: receiver.pq_signed_prekey.key.public.clone(),
//! };
//! let out = encapsulate(&params, &recipient_public, None).expect("encapsulate");
//!
//! // Responder side: recover the same secret from the ciphertext
//! let recipient_private = RecipientPrivateKeys {
//!     ecc_private: receiver.signed_prekey.key.secret.to_vec(),
//!     pqkem_private: receiver.pq_signed_prekey.key.secret.clone(),
//! };
//! let shared = decapsulate(&params, &out.ciphertext, &recipient_private, &out.ephemeral_public)
//!     .expect("decapsulate");
//! assert_eq!(shared, out.shared_secret);
//! ```
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`crypto`] | X25519 ECDH, ML-KEM encapsulation, hybrid secret derivation, secure erase |
//! | [`keys`] | Identity keys, signed/one-time prekeys, per-identity `KeyStore` |
//! | [`params`] | Versioned protocol parameters and tagged wire codecs |
//! | [`protocol`] | Top-level `encapsulate`/`decapsulate`, prekey bundle |
//! | [`error`] | Crate-wide error type |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `std` | Yes | Standard library support |
//! | `wasm` | No | WebAssembly support (`getrandom/js`) |

// ── Public modules ──────────────────────────────────────────────────────────

/// Cryptographic primitives: X25519 key exchange, ML-KEM, hybrid secret
/// derivation, secure erase.
pub mod crypto;

/// Crate-wide error type and `Result` alias.
pub mod error;

/// Key material generation, prekey lifecycle, and the `KeyStore` ledger.
pub mod keys;

/// Protocol parameters and wire encoding of public keys.
pub mod params;

/// Top-level key-agreement entry points and the prekey bundle.
pub mod protocol;

// ── Re-exports for convenience ──────────────────────────────────────────────

pub use crypto::hybrid::{derive_shared_secret, HashAlg, HybridMode};
pub use crypto::kem::{KemKeyPair, KemVariant};
pub use crypto::secure_erase::secure_erase;
pub use error::{PqxdhError, Result};
pub use keys::{
    create_receiver_keys, create_sender_keys, EcKeyPair, KeyStore, PreKeyId, ReceiverKeys,
    SenderKeys,
};
pub use params::{Curve, ProtocolParams, PROTOCOL_VERSION};
pub use protocol::{
    decapsulate, encapsulate, EncapsulationResult, PreKeyBundle, RecipientPrivateKeys,
    RecipientPublicKeys,
};

// ── Library metadata ────────────────────────────────────────────────────────

/// PQXDH Core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
pub fn version() -> &'static str {
    VERSION
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().contains('.'));
    }

    #[test]
    fn test_default_params_scenario() {
        // ml-kem-768 under SHA-256/hkdf: 32/32-byte EC keys, 1184/2400-byte
        // KEM keys, 1088-byte ciphertext, 32-byte session secret.
        let params = ProtocolParams::v1();
        let receiver = create_receiver_keys(&params).unwrap();

        assert_eq!(receiver.identity.public.len(), 32);
        assert_eq!(receiver.identity.secret.len(), 32);
        assert_eq!(receiver.pq_signed_prekey.key.public.len(), 1184);
        assert_eq!(receiver.pq_signed_prekey.key.secret.len(), 2400);

        let out = encapsulate(
            &params,
            &RecipientPublicKeys {
                ecc: receiver.signed_prekey.key.public.to_vec(),
                pqkem: receiver.pq_signed_prekey.key.public.clone(),
            },
            None,
        )
        .unwrap();

        assert_eq!(out.ciphertext.len(), 1088);
        assert_eq!(out.shared_secret.len(), 32);
    }
}
