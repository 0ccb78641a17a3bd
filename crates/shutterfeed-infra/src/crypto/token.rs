//! Opaque session token generation.

use argon2::password_hash::rand_core::{OsRng, RngCore};

/// Prefix on every locally issued token.
pub const TOKEN_PREFIX: &str = "sfs_";

/// 32 random bytes, hex-encoded, with the `sfs_` prefix.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!(
        "{TOKEN_PREFIX}{}",
        bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + 64);
        assert_ne!(token, generate_token());
    }
}
