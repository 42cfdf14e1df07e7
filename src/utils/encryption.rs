// Authenticated-encryption kernel for customer-identifying data (AES-256-GCM).
// Every encrypted column stored by this service carries the `enc:v1:` prefix
// so existing plaintext (or a future v2 envelope) can be told apart from it.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::env;

/// Size of the nonce for AES-GCM (96 bits / 12 bytes)
const NONCE_SIZE: usize = 12;

/// Marker prefix for ciphertext produced by this kernel. Anything stored
/// without this prefix is either legacy plaintext or corrupt data, never a
/// value this kernel will attempt to decrypt.
pub const CIPHERTEXT_PREFIX: &str = "enc:v1:";

/// Process-wide encryption key, loaded once from the environment at startup.
/// `ENCRYPTION_KEY` must be exactly 32 ASCII bytes (256 bits); its raw bytes
/// are used as the AES-256 key directly (no base64 decoding), matching the
/// "encryption key (32 chars)" configuration contract.
#[derive(Clone)]
pub struct EncryptionKey {
    cipher: Aes256Gcm,
}

impl EncryptionKey {
    /// Initialize the encryption key from the `ENCRYPTION_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let key = env::var("ENCRYPTION_KEY").context("ENCRYPTION_KEY environment variable not set")?;
        Self::from_str(&key)
    }

    /// Build directly from a 32-byte key string. Exposed for tests and for
    /// bootstrap code that wants to validate the key before constructing
    /// the rest of the application state.
    pub fn from_str(key: &str) -> Result<Self> {
        if key.len() != 32 {
            anyhow::bail!(
                "ENCRYPTION_KEY must be exactly 32 bytes, got {} bytes",
                key.len()
            );
        }

        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .context("failed to construct cipher from encryption key")?;

        Ok(Self { cipher })
    }

    /// True if `value` carries this kernel's ciphertext marker.
    pub fn is_ciphertext(value: &str) -> bool {
        value.starts_with(CIPHERTEXT_PREFIX)
    }

    /// Encrypt plaintext data.
    /// Returns `enc:v1:<base64(nonce || ciphertext || tag)>`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("encryption failed: {}", e))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", CIPHERTEXT_PREFIX, BASE64.encode(combined)))
    }

    /// Decrypt a value produced by [`EncryptionKey::encrypt`].
    /// Fails loudly (rather than returning the ciphertext unchanged) if the
    /// prefix is missing, the base64/nonce framing is malformed, or the
    /// AEAD tag does not verify.
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let encoded = stored
            .strip_prefix(CIPHERTEXT_PREFIX)
            .context("value is not in the expected enc:v1: envelope")?;

        let combined = BASE64
            .decode(encoded)
            .context("failed to decode encrypted data from base64")?;

        if combined.len() < NONCE_SIZE {
            anyhow::bail!("encrypted data is too short");
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext_bytes = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| anyhow::anyhow!("decryption failed: {}", e))?;

        String::from_utf8(plaintext_bytes).context("decrypted data is not valid UTF-8")
    }

    /// Encrypt an optional string field.
    pub fn encrypt_optional(&self, plaintext: &Option<String>) -> Result<Option<String>> {
        match plaintext {
            Some(text) => Ok(Some(self.encrypt(text)?)),
            None => Ok(None),
        }
    }

    /// Decrypt an optional string field.
    pub fn decrypt_optional(&self, encrypted: &Option<String>) -> Result<Option<String>> {
        match encrypted {
            Some(text) => Ok(Some(self.decrypt(text)?)),
            None => Ok(None),
        }
    }

    /// Encrypt a JSON-serializable value as a single ciphertext blob.
    /// Used to store encrypted string lists (medical history, allergies,
    /// current medications) as one column rather than one row per item.
    pub fn encrypt_json<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = serde_json::to_string(data).context("failed to serialize data to JSON")?;
        self.encrypt(&json)
    }

    /// Decrypt a JSON blob produced by [`EncryptionKey::encrypt_json`].
    pub fn decrypt_json<T: for<'de> Deserialize<'de>>(&self, encrypted: &str) -> Result<T> {
        let json = self.decrypt(encrypted)?;
        serde_json::from_str(&json).context("failed to deserialize decrypted JSON")
    }
}

/// Generate a new random 32-byte key, printed as a raw string suitable for
/// direct use as `ENCRYPTION_KEY` (used by ops tooling / key rotation, not
/// by the running service).
pub fn generate_encryption_key() -> String {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    // Encode as base64 and truncate/pad to exactly 32 printable characters
    // so operators get a key of the length the service expects.
    let b64 = BASE64.encode(key);
    b64.chars().take(32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        age: u32,
    }

    fn setup_test_key() -> EncryptionKey {
        EncryptionKey::from_str("01234567890123456789012345678901").unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_string() {
        let key = setup_test_key();
        let plaintext = "Penicillin allergy";

        let encrypted = key.encrypt(plaintext).unwrap();
        assert_ne!(encrypted, plaintext);
        assert!(encrypted.starts_with(CIPHERTEXT_PREFIX));

        let decrypted = key.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_fresh_nonce_each_call() {
        let key = setup_test_key();
        let a = key.encrypt("same plaintext").unwrap();
        let b = key.encrypt("same plaintext").unwrap();
        assert_ne!(a, b, "two encryptions of the same plaintext must differ");
    }

    #[test]
    fn test_encrypt_decrypt_optional() {
        let key = setup_test_key();

        let some_value = Some("insurance-id-123".to_string());
        let encrypted = key.encrypt_optional(&some_value).unwrap();
        assert!(encrypted.is_some());

        let decrypted = key.decrypt_optional(&encrypted).unwrap();
        assert_eq!(decrypted, some_value);

        let none_value: Option<String> = None;
        assert!(key.encrypt_optional(&none_value).unwrap().is_none());
    }

    #[test]
    fn test_encrypt_decrypt_json() {
        let key = setup_test_key();
        let data = TestData {
            name: "amoxicillin".to_string(),
            age: 35,
        };

        let encrypted = key.encrypt_json(&data).unwrap();
        let decrypted: TestData = key.decrypt_json(&encrypted).unwrap();

        assert_eq!(decrypted, data);
    }

    #[test]
    fn test_key_wrong_length_rejected() {
        assert!(EncryptionKey::from_str("too-short").is_err());
        assert!(EncryptionKey::from_str(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = setup_test_key();
        let plaintext = "secret data";

        let encrypted = key1.encrypt(plaintext).unwrap();

        let key2 = EncryptionKey::from_str("98765432109876543210987654321098").unwrap();
        assert!(key2.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_decrypt_corrupted_data_fails() {
        let key = setup_test_key();

        assert!(key.decrypt("not-in-the-expected-envelope").is_err());
        assert!(key.decrypt("enc:v1:not-valid-base64!!!").is_err());

        let short_data = format!("enc:v1:{}", BASE64.encode([0u8; 5]));
        assert!(key.decrypt(&short_data).is_err());
    }

    #[test]
    fn test_is_ciphertext() {
        assert!(EncryptionKey::is_ciphertext("enc:v1:abcd"));
        assert!(!EncryptionKey::is_ciphertext("plain legacy text"));
    }
}
