pub mod hybrid;
pub mod kem;
pub mod key_exchange;
pub mod secure_erase;

pub use hybrid::{derive_shared_secret, HashAlg, HybridMode};
pub use kem::{KemKeyPair, KemVariant, KEM_SHARED_SECRET_BYTES};
pub use key_exchange::{compute_shared_secret, generate_keypair, X25519_KEY_BYTES};
pub use secure_erase::secure_erase;
