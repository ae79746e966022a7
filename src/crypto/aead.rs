//! Authenticated Encryption with Associated Data (AEAD).
//!
//! AES-256-GCM with 256-bit keys, 96-bit nonces and 128-bit tags. This is
//! the cipher the server expects for session tickets.

use aes_gcm::aead::{Aead as AeadTrait, KeyInit, Payload};
use aes_gcm::Aes256Gcm;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};

/// A symmetric key for AEAD operations.
///
/// Automatically zeroized when dropped.
#[derive(Clone, Debug, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AeadKey([u8; KEY_SIZE]);

impl AeadKey {
    /// Create a new AEAD key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw key bytes.
    ///
    /// # Security
    ///
    /// Handle with care - this is secret key material.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for AeadKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A nonce (number used once) for AEAD operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Create a nonce from raw bytes.
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Take the first 12 bytes of `bytes` as a nonce.
    pub fn from_prefix(bytes: &[u8]) -> Result<Self> {
        let prefix = bytes.get(..NONCE_SIZE).ok_or(Error::Buffer {
            expected: NONCE_SIZE,
            actual: bytes.len(),
        })?;
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(prefix);
        Ok(Self(nonce))
    }

    /// Get the raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// An AES-256-GCM instance bound to one key.
pub struct Aead {
    cipher: Box<Aes256Gcm>,
}

impl Aead {
    /// Create a new AEAD instance with the given key.
    pub fn new(key: &AeadKey) -> Self {
        Self {
            cipher: Box::new(Aes256Gcm::new(key.as_bytes().into())),
        }
    }

    /// Encrypt plaintext with associated authenticated data.
    ///
    /// Returns ciphertext || tag (16 bytes appended).
    ///
    /// # Arguments
    ///
    /// * `nonce` - Must not repeat for this key with a different plaintext
    /// * `plaintext` - Data to encrypt
    /// * `aad` - Additional data to authenticate (but not encrypt)
    pub fn encrypt(&self, nonce: &Nonce, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload {
            msg: plaintext,
            aad,
        };

        self.cipher
            .encrypt(nonce.as_bytes().into(), payload)
            .map_err(|_| Error::crypto("encryption failed"))
    }

    /// Decrypt ciphertext with associated authenticated data.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails (wrong key, tampered data, etc.)
    pub fn decrypt(&self, nonce: &Nonce, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_SIZE {
            return Err(Error::Buffer {
                expected: TAG_SIZE,
                actual: ciphertext.len(),
            });
        }

        let payload = Payload {
            msg: ciphertext,
            aad,
        };

        self.cipher
            .decrypt(nonce.as_bytes().into(), payload)
            .map_err(|_| Error::crypto("decryption/authentication failed"))
    }
}

/// Calculate the ciphertext length for a given plaintext length.
pub const fn ciphertext_len(plaintext_len: usize) -> usize {
    plaintext_len + TAG_SIZE
}
