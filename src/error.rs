//! Crate-wide error type.
//!
//! Every failure in this crate is a synchronous, non-retryable validation
//! or primitive failure. Nothing is recovered locally; errors propagate to
//! the caller immediately, and any intermediate secret computed before the
//! failure is zeroized before the error leaves the function that owned it.

use thiserror::Error;

use crate::crypto::kem::KemVariant;

#[derive(Error, Debug)]
pub enum PqxdhError {
    /// An EC key (or KEM public key) did not have the exact length its
    /// algorithm requires.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// `xor` hybrid mode was asked to combine secrets of unequal length.
    #[error("key length mismatch: xor mode requires equal-length secrets ({ecc} vs {pq} bytes)")]
    KeyLengthMismatch { ecc: usize, pq: usize },

    /// Unrecognized hybrid combination mode.
    #[error("invalid hybrid mode: {0:?}")]
    InvalidMode(String),

    /// A KEM ciphertext or decapsulation key did not match the configured
    /// variant's fixed length.
    #[error("invalid {field} length for {kem}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        kem: KemVariant,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Curve identifier outside the supported set. There is no fallback.
    #[error("unsupported curve: {0:?}")]
    UnsupportedCurve(String),

    /// KEM identifier outside the supported set.
    #[error("unsupported KEM: {0:?}")]
    UnsupportedKem(String),

    #[error("ML-KEM encapsulation failed")]
    EncapsulationFailed,

    #[error("ML-KEM decapsulation failed")]
    DecapsulationFailed,

    #[error("HKDF expansion failed")]
    KdfExpandFailed,

    #[error("prekey bundle encoding failed: {0}")]
    BundleEncoding(String),

    #[error("prekey bundle decoding failed: {0}")]
    BundleDecoding(String),
}

pub type Result<T> = std::result::Result<T, PqxdhError>;
