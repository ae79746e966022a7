//! Cryptographic primitives for covert tokens.
//!
//! This module provides:
//! - X25519 Elliptic Curve Diffie-Hellman key agreement
//! - AES-256-GCM AEAD encryption
//! - Injectable entropy and seeded pseudo-random padding
//!
//! All secret material is zeroized on drop to prevent memory leakage.

mod aead;
mod keys;
mod random;

pub use aead::{ciphertext_len, Aead, AeadKey, Nonce};
pub use keys::{EphemeralKeyPair, PublicKey, SharedSecret, StaticSecret};
pub use random::{fill_seeded, random_bytes, EntropySource, OsEntropy};

#[cfg(test)]
pub(crate) use random::tests::FailingEntropy;

/// Size of symmetric keys in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of AEAD nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of AEAD authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of X25519 public keys in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;
