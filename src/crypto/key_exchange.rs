//! X25519 Diffie-Hellman key agreement (RFC 7748).
//!
//! The classical half of the hybrid key agreement. All keys are raw 32-byte
//! buffers; any other length is rejected before key material is touched.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::{PqxdhError, Result};

/// X25519 public and private key size in bytes
pub const X25519_KEY_BYTES: usize = 32;

/// Generate a random X25519 keypair
///
/// # Returns
/// (public_key, secret_key) - Both as 32-byte arrays
pub fn generate_keypair() -> ([u8; 32], [u8; 32]) {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);

    (public.to_bytes(), secret.to_bytes())
}

/// Build an X25519 keypair from a 32-byte seed (deterministic)
///
/// The seed is used directly as the private scalar; clamping per RFC 7748
/// happens inside the scalar multiplication.
pub fn keypair_from_seed(seed: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    let secret = StaticSecret::from(*seed);
    let public = PublicKey::from(&secret);

    (public.to_bytes(), secret.to_bytes())
}

/// Derive the public key matching a 32-byte X25519 private key
pub fn derive_public_key(private_key: &[u8]) -> Result<[u8; 32]> {
    if private_key.len() != X25519_KEY_BYTES {
        return Err(PqxdhError::InvalidKeyLength {
            expected: X25519_KEY_BYTES,
            actual: private_key.len(),
        });
    }

    let mut secret_bytes = [0u8; 32];
    secret_bytes.copy_from_slice(private_key);
    let secret = StaticSecret::from(secret_bytes);
    secret_bytes.zeroize();

    let public = PublicKey::from(&secret);

    Ok(public.to_bytes())
}

/// Compute the X25519 shared secret between a private and a public key
///
/// The private key is copied into a fresh buffer before use and every
/// working copy is zeroized before this function returns. The returned
/// 32-byte secret is owned by the caller, who is responsible for erasing
/// it once consumed.
///
/// # Errors
/// `InvalidKeyLength` if either input is not exactly 32 bytes.
pub fn compute_shared_secret(private_key: &[u8], public_key: &[u8]) -> Result<[u8; 32]> {
    if private_key.len() != X25519_KEY_BYTES {
        return Err(PqxdhError::InvalidKeyLength {
            expected: X25519_KEY_BYTES,
            actual: private_key.len(),
        });
    }

    if public_key.len() != X25519_KEY_BYTES {
        return Err(PqxdhError::InvalidKeyLength {
            expected: X25519_KEY_BYTES,
            actual: public_key.len(),
        });
    }

    // Isolate the private key into a fresh buffer
    let mut secret_bytes = [0u8; 32];
    secret_bytes.copy_from_slice(private_key);
    let secret = StaticSecret::from(secret_bytes);
    secret_bytes.zeroize();

    let mut public_bytes = [0u8; 32];
    public_bytes.copy_from_slice(public_key);
    let public = PublicKey::from(public_bytes);

    // `SharedSecret` zeroizes its own buffer on drop; copy the result out
    // so nothing aliases the internal working memory.
    let shared_secret = secret.diffie_hellman(&public);

    Ok(shared_secret.to_bytes())
}
