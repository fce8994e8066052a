//! Hashing helpers shared by session keys, scan ids and anonymized metadata.

use sha2::{Digest, Sha256};

/// Full SHA-256 hex digest of `input`.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Hex encoding of the first `bytes` bytes of SHA-256(`input`).
pub fn truncated_hash(input: &str, bytes: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..bytes.min(digest.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_hash_length() {
        assert_eq!(truncated_hash("cursor:c1", 8).len(), 16);
        assert_eq!(truncated_hash("cursor:c1", 16).len(), 32);
        assert_eq!(truncated_hash("cursor:c1", 64).len(), 64);
    }

    #[test]
    fn test_truncated_hash_is_prefix_of_full() {
        let full = sha256_hex("intentra");
        assert!(full.starts_with(&truncated_hash("intentra", 8)));
    }
}
