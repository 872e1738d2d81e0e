//! Best-effort erasure of transient secret buffers.
//!
//! Backed by the `zeroize` crate, which performs the overwrite through
//! volatile writes followed by a compiler fence so the store cannot be
//! elided as dead. Callers must not retain aliases into an erased buffer.

use zeroize::Zeroize;

/// Overwrite a secret buffer with zeros before it goes out of scope
pub fn secure_erase(buffer: &mut [u8]) {
    buffer.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_is_all_zero_after_erase() {
        let mut secret = [0xABu8; 64];
        secure_erase(&mut secret);
        assert!(secret.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_buffer_is_a_noop() {
        let mut empty: [u8; 0] = [];
        secure_erase(&mut empty);
    }

    #[test]
    fn test_vec_contents_erased_in_place() {
        let mut secret = vec![0x42u8; 1088];
        secure_erase(&mut secret);
        assert_eq!(secret.len(), 1088);
        assert!(secret.iter().all(|&b| b == 0));
    }
}
