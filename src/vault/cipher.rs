//! Authenticated encryption for credential material at rest.
//!
//! # Responsibilities
//! - Hold the single process-wide 256-bit vault key, read once at startup
//! - Encrypt material under AES-256-GCM with a fresh random 128-bit IV
//! - Verify the authentication tag on every decrypt
//!
//! # Security
//! - The key is loaded ONLY from an environment variable
//! - The key and decrypted material are never logged or serialized
//! - There is no rotation path: rotating the key invalidates every blob
//!   encrypted under the previous key

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// AES-256-GCM with the provider's 128-bit IV convention.
type CredentialCipher = AesGcm<Aes256, U16>;

const IV_LEN: usize = 16;
const TAG_LEN: usize = 16;

/// Errors from vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The process-wide key is absent or malformed. Fatal at startup only.
    #[error("vault key misconfigured: {0}")]
    Configuration(String),

    /// Tag verification or blob decoding failed. The stored pair is
    /// unusable and the user must re-authenticate.
    #[error("credential blob failed integrity verification; re-authentication required")]
    Integrity,

    /// Material could not be serialized for encryption.
    #[error("credential material could not be encoded: {0}")]
    Encoding(serde_json::Error),

    /// No blob pair stored for this user.
    #[error("no stored credentials for user {0}; authentication required")]
    NotEnrolled(Uuid),
}

/// Persisted form of a credential or session.
///
/// Three independent opaque hex strings. A blob decrypts only under the
/// exact key that produced it, and only if none of the three fields were
/// altered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    pub ciphertext: String,
    pub iv: String,
    pub tag: String,
}

/// The process-wide symmetric cipher for credential material.
#[derive(Clone)]
pub struct VaultCipher {
    cipher: CredentialCipher,
}

impl VaultCipher {
    /// Build from exactly 32 key bytes.
    pub fn new(key: [u8; 32]) -> Self {
        let cipher = CredentialCipher::new((&key).into());
        Self { cipher }
    }

    /// Build from a hex-encoded key string.
    pub fn from_hex(raw: &str) -> Result<Self, VaultError> {
        let bytes = hex::decode(raw.trim())
            .map_err(|e| VaultError::Configuration(format!("vault key is not valid hex: {e}")))?;
        let key: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            VaultError::Configuration(format!(
                "vault key must be exactly 32 bytes, got {}",
                b.len()
            ))
        })?;
        Ok(Self::new(key))
    }

    /// Read the key from the named environment variable, once at startup.
    pub fn from_env(var: &str) -> Result<Self, VaultError> {
        let raw = std::env::var(var).map_err(|_| {
            VaultError::Configuration(format!("environment variable {var} not set"))
        })?;
        Self::from_hex(&raw)
    }

    /// Encrypt a structured record of key material.
    pub fn encrypt<T: Serialize>(&self, material: &T) -> Result<EncryptedBlob, VaultError> {
        let plaintext = serde_json::to_vec(material).map_err(VaultError::Encoding)?;

        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let nonce = aes_gcm::Nonce::<U16>::from(iv);

        // AEAD output is ciphertext || tag; the blob stores them detached.
        let mut sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| VaultError::Integrity)?;
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(EncryptedBlob {
            ciphertext: hex::encode(sealed),
            iv: hex::encode(iv),
            tag: hex::encode(tag),
        })
    }

    /// Decrypt a blob back into its material record.
    pub fn decrypt<T: DeserializeOwned>(&self, blob: &EncryptedBlob) -> Result<T, VaultError> {
        let ciphertext = hex::decode(&blob.ciphertext).map_err(|_| VaultError::Integrity)?;
        let iv = hex::decode(&blob.iv).map_err(|_| VaultError::Integrity)?;
        let tag = hex::decode(&blob.tag).map_err(|_| VaultError::Integrity)?;

        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(VaultError::Integrity);
        }
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| VaultError::Integrity)?;
        let nonce = aes_gcm::Nonce::<U16>::from(iv);

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let plaintext = self
            .cipher
            .decrypt(&nonce, sealed.as_slice())
            .map_err(|_| VaultError::Integrity)?;

        serde_json::from_slice(&plaintext).map_err(|_| VaultError::Integrity)
    }
}

impl std::fmt::Debug for VaultCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::material::{KeyShareRecord, SecretBytes, SigningCredential};

    fn test_cipher() -> VaultCipher {
        VaultCipher::new([0x42u8; 32])
    }

    fn test_credential() -> SigningCredential {
        SigningCredential {
            keys: vec![KeyShareRecord {
                provider: "mpc".to_string(),
                public_key: "pk-main".to_string(),
                private_key: SecretBytes::from(vec![0xed, 0x05, 0x00, 0x7f, 0xff]),
            }],
        }
    }

    fn flip_last_hex_digit(field: &mut String) {
        let flipped = if field.ends_with('0') { '1' } else { '0' };
        field.pop();
        field.push(flipped);
    }

    #[test]
    fn test_roundtrip_restores_byte_fields_exactly() {
        let cipher = test_cipher();
        let credential = test_credential();

        let blob = cipher.encrypt(&credential).unwrap();
        let decrypted: SigningCredential = cipher.decrypt(&blob).unwrap();

        assert_eq!(decrypted.keys.len(), 1);
        assert_eq!(decrypted.keys[0].public_key, "pk-main");
        assert_eq!(
            decrypted.keys[0].private_key.as_bytes(),
            &[0xed, 0x05, 0x00, 0x7f, 0xff]
        );
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let cipher = test_cipher();
        let credential = test_credential();

        let a = cipher.encrypt(&credential).unwrap();
        let b = cipher.encrypt(&credential).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_fails_integrity() {
        let cipher = test_cipher();
        let mut blob = cipher.encrypt(&test_credential()).unwrap();
        flip_last_hex_digit(&mut blob.ciphertext);

        let err = cipher.decrypt::<SigningCredential>(&blob).unwrap_err();
        assert!(matches!(err, VaultError::Integrity));
    }

    #[test]
    fn test_tampered_iv_fails_integrity() {
        let cipher = test_cipher();
        let mut blob = cipher.encrypt(&test_credential()).unwrap();
        flip_last_hex_digit(&mut blob.iv);

        let err = cipher.decrypt::<SigningCredential>(&blob).unwrap_err();
        assert!(matches!(err, VaultError::Integrity));
    }

    #[test]
    fn test_tampered_tag_fails_integrity() {
        let cipher = test_cipher();
        let mut blob = cipher.encrypt(&test_credential()).unwrap();
        flip_last_hex_digit(&mut blob.tag);

        let err = cipher.decrypt::<SigningCredential>(&blob).unwrap_err();
        assert!(matches!(err, VaultError::Integrity));
    }

    #[test]
    fn test_wrong_key_fails_integrity() {
        let k1 = VaultCipher::new([0x01u8; 32]);
        let k2 = VaultCipher::new([0x02u8; 32]);

        let blob = k1.encrypt(&test_credential()).unwrap();
        let err = k2.decrypt::<SigningCredential>(&blob).unwrap_err();
        assert!(matches!(err, VaultError::Integrity));
    }

    #[test]
    fn test_malformed_blob_fails_integrity() {
        let cipher = test_cipher();
        let blob = EncryptedBlob {
            ciphertext: "not hex".to_string(),
            iv: "00".repeat(16),
            tag: "00".repeat(16),
        };
        let err = cipher.decrypt::<SigningCredential>(&blob).unwrap_err();
        assert!(matches!(err, VaultError::Integrity));
    }

    #[test]
    fn test_key_must_be_32_bytes() {
        let err = VaultCipher::from_hex("deadbeef").unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
        assert!(err.to_string().contains("32 bytes"));

        let err = VaultCipher::from_hex("zz").unwrap_err();
        assert!(matches!(err, VaultError::Configuration(_)));
    }

    #[test]
    fn test_key_from_hex_accepts_exact_length() {
        let raw = "11".repeat(32);
        assert!(VaultCipher::from_hex(&raw).is_ok());
    }
}
