//! SHA-256 hashing for session tokens.
//!
//! Only the digest of a token is ever stored in the database.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `content`.
pub fn sha256_hex(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hash_known_value() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_hash_is_lowercase_hex() {
        let hash = sha256_hex("sfs_token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(hash, sha256_hex("sfs_token2"));
    }
}
