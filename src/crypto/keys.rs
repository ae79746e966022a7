//! X25519 key agreement primitives.
//!
//! Provides type-safe wrappers around X25519 operations with automatic
//! zeroization of secret material on drop.

use x25519_dalek::{
    PublicKey as DalekPublic, SharedSecret as DalekShared, StaticSecret as DalekStatic,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::random::{random_bytes, EntropySource};
use crate::crypto::{AeadKey, PUBLIC_KEY_SIZE};
use crate::error::{Error, Result};

/// A reusable X25519 secret key.
///
/// Used both for a server's long-term identity and for per-bucket
/// ephemeral keys, which are shared by every ticket built in their bucket
/// and so cannot be consumed on first use. Zeroized when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct StaticSecret(DalekStatic);

impl StaticSecret {
    /// Generate a new secret from the given entropy source.
    pub fn generate(entropy: &dyn EntropySource) -> Result<Self> {
        let mut bytes = random_bytes::<32>(entropy)?;
        let secret = Self::from_bytes(bytes);
        bytes.zeroize();
        Ok(secret)
    }

    /// Create from raw bytes.
    ///
    /// # Security
    ///
    /// The input bytes should come from a cryptographically secure source.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(DalekStatic::from(bytes))
    }

    /// Export the secret key bytes.
    ///
    /// # Security
    ///
    /// Handle the returned bytes with care and zeroize when done.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Perform X25519 Diffie-Hellman key agreement.
    ///
    /// Fails if the peer key is a low-order point, which would force an
    /// all-zero shared secret regardless of our secret.
    pub fn diffie_hellman(&self, their_public: &PublicKey) -> Result<SharedSecret> {
        let shared = self.0.diffie_hellman(&their_public.0);
        if !shared.was_contributory() {
            return Err(Error::key_exchange("peer public key is a low-order point"));
        }
        Ok(SharedSecret(shared))
    }
}

impl From<&StaticSecret> for PublicKey {
    fn from(secret: &StaticSecret) -> Self {
        PublicKey(DalekPublic::from(&secret.0))
    }
}

/// An ephemeral key pair scoped to a single time bucket.
pub struct EphemeralKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a fresh key pair.
    pub fn generate(entropy: &dyn EntropySource) -> Result<Self> {
        let secret = StaticSecret::generate(entropy)?;
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// The public half, as it appears on the wire.
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// Agree on a shared secret with a peer's public key.
    pub fn diffie_hellman(&self, their_public: &PublicKey) -> Result<SharedSecret> {
        self.secret.diffie_hellman(their_public)
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// An X25519 public key.
///
/// Safe to share publicly. Used for key exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(DalekPublic);

impl PublicKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(DalekPublic::from(bytes))
    }

    /// Create from a slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| Error::Buffer {
            expected: PUBLIC_KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Get the raw bytes of this public key.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.0.as_bytes()
    }

    /// Convert to raw bytes.
    pub fn to_bytes(self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// The result of an X25519 Diffie-Hellman key exchange.
///
/// Zeroized on drop by the underlying implementation.
pub struct SharedSecret(DalekShared);

impl SharedSecret {
    /// Get the raw shared secret bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Use the raw shared secret directly as an AEAD key.
    pub fn to_aead_key(&self) -> AeadKey {
        AeadKey::from_bytes(*self.0.as_bytes())
    }
}
