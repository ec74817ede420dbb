//! Symmetric encryption for stored model credentials.
//!
//! AES-256-GCM with a key derived from the configured passphrase.
//! Ciphertext is stored as hex of `[12-byte nonce][ciphertext + tag]`.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;

/// Credential encryption errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Stored ciphertext is malformed")]
    Malformed,
}

/// Encrypts and decrypts credential secrets with a fixed key.
#[derive(Clone)]
pub struct SecretBox {
    key: [u8; 32],
}

impl SecretBox {
    /// Derive the cipher key from a passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypt a secret with a random nonce, returning hex.
    pub fn seal(&self, secret: &SecretString) -> Result<String, CryptoError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, secret.expose_secret().as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut bytes = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        bytes.extend_from_slice(&nonce_bytes);
        bytes.extend_from_slice(&ciphertext);

        Ok(hex::encode(bytes))
    }

    /// Decrypt a value produced by [`SecretBox::seal`].
    pub fn open(&self, sealed: &str) -> Result<SecretString, CryptoError> {
        let bytes = hex::decode(sealed).map_err(|_| CryptoError::Malformed)?;
        if bytes.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CryptoError::Malformed);
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LENGTH);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        let text = String::from_utf8(plaintext).map_err(|_| CryptoError::Malformed)?;
        Ok(SecretString::from(text))
    }
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretBox([REDACTED])")
    }
}
