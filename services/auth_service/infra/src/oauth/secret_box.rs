//! AES-256-GCM envelope for OAuth client secrets at rest
//!
//! Envelope format: `enc:v1:<nonce-b64>:<ciphertext-b64>`. Without a
//! configured key, secrets pass through unchanged (plaintext storage).

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use shared_error::AppError;

const ENVELOPE_PREFIX: &str = "enc:v1:";

#[derive(Clone)]
pub struct SecretBox {
    key: Option<[u8; 32]>,
}

impl SecretBox {
    /// Build from a base64-encoded 32-byte key; None disables encryption
    pub fn new(encoded_key: Option<&str>) -> Result<Self, AppError> {
        let key = match encoded_key {
            Some(encoded) => {
                let bytes = STANDARD.decode(encoded).map_err(|_| {
                    AppError::Internal("Secret encryption key is not valid base64".to_string())
                })?;
                let key: [u8; 32] = bytes.try_into().map_err(|_| {
                    AppError::Internal("Secret encryption key must be 32 bytes".to_string())
                })?;
                Some(key)
            },
            None => None,
        };
        Ok(Self { key })
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Seal a plaintext secret into the envelope (identity when disabled)
    pub fn seal(&self, plaintext: &str) -> Result<String, AppError> {
        let Some(key) = &self.key else {
            return Ok(plaintext.to_string());
        };

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| AppError::Internal("Secret encryption failed".to_string()))?;

        Ok(format!(
            "{}{}:{}",
            ENVELOPE_PREFIX,
            STANDARD.encode(nonce_bytes),
            STANDARD.encode(ciphertext)
        ))
    }

    /// Open an envelope back into the plaintext secret; plaintext values
    /// (pre-encryption rows, or encryption disabled) pass through
    pub fn open(&self, stored: &str) -> Result<String, AppError> {
        let Some(rest) = stored.strip_prefix(ENVELOPE_PREFIX) else {
            return Ok(stored.to_string());
        };

        let key = self.key.as_ref().ok_or_else(|| {
            AppError::Internal("Encrypted secret found but no encryption key configured".to_string())
        })?;

        let (nonce_b64, ct_b64) = rest
            .split_once(':')
            .ok_or_else(|| AppError::Internal("Malformed secret envelope".to_string()))?;

        let nonce_bytes = STANDARD
            .decode(nonce_b64)
            .map_err(|_| AppError::Internal("Malformed secret envelope".to_string()))?;
        let ciphertext = STANDARD
            .decode(ct_b64)
            .map_err(|_| AppError::Internal("Malformed secret envelope".to_string()))?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| AppError::Internal("Secret decryption failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| AppError::Internal("Decrypted secret is not UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> String {
        STANDARD.encode([42u8; 32])
    }

    #[test]
    fn test_seal_open_round_trip() {
        let secret_box = SecretBox::new(Some(&test_key())).unwrap();
        let sealed = secret_box.seal("client-secret-value").unwrap();

        assert!(sealed.starts_with("enc:v1:"));
        assert_ne!(sealed, "client-secret-value");
        assert_eq!(secret_box.open(&sealed).unwrap(), "client-secret-value");
    }

    #[test]
    fn test_disabled_box_passes_through() {
        let secret_box = SecretBox::new(None).unwrap();
        assert!(!secret_box.is_enabled());
        assert_eq!(secret_box.seal("plain").unwrap(), "plain");
        assert_eq!(secret_box.open("plain").unwrap(), "plain");
    }

    #[test]
    fn test_plaintext_rows_open_unchanged_with_key() {
        // Rows written before encryption was enabled
        let secret_box = SecretBox::new(Some(&test_key())).unwrap();
        assert_eq!(secret_box.open("legacy-plain").unwrap(), "legacy-plain");
    }

    #[test]
    fn test_envelope_requires_key() {
        let with_key = SecretBox::new(Some(&test_key())).unwrap();
        let sealed = with_key.seal("secret").unwrap();

        let without_key = SecretBox::new(None).unwrap();
        assert!(without_key.open(&sealed).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = SecretBox::new(Some(&test_key())).unwrap();
        let sealed = a.seal("secret").unwrap();

        let b = SecretBox::new(Some(&STANDARD.encode([9u8; 32]))).unwrap();
        assert!(b.open(&sealed).is_err());
    }

    #[test]
    fn test_bad_key_material_rejected() {
        assert!(SecretBox::new(Some("not base64 !!!")).is_err());
        assert!(SecretBox::new(Some(&STANDARD.encode([1u8; 16]))).is_err());
    }
}
