//! Opaque token generation and hashing
//!
//! Refresh tokens are 64-character URL-safe random strings, single-use
//! tokens 32 characters. Only the SHA-256 hex digest is ever persisted.

use rand::Rng;
use sha2::{Digest, Sha256};

const URL_SAFE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Refresh token length
pub const REFRESH_TOKEN_LEN: usize = 64;
/// Password-reset / email-confirmation token length
pub const SINGLE_USE_TOKEN_LEN: usize = 32;

/// Generate a URL-safe random token of the given length
pub fn generate_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..URL_SAFE_CHARS.len());
            URL_SAFE_CHARS[idx] as char
        })
        .collect()
}

/// SHA-256 hex digest for at-rest storage and lookup
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_charset() {
        let token = generate_token(REFRESH_TOKEN_LEN);
        assert_eq!(token.len(), 64);
        assert!(token
            .bytes()
            .all(|b| URL_SAFE_CHARS.contains(&b)));

        let token = generate_token(SINGLE_USE_TOKEN_LEN);
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_token(64);
        let b = generate_token(64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_stable_hex_sha256() {
        let h = hash_token("abc");
        // Known SHA-256 of "abc"
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(h, hash_token("abc"));
    }
}
