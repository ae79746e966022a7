//! Error types for covert token construction.

use thiserror::Error;

/// Result type alias for covert-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or opening covert tokens.
#[derive(Error, Debug)]
pub enum Error {
    /// The randomness source could not deliver bytes
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// Key agreement with the peer's static key failed
    #[error("key exchange failed: {0}")]
    KeyExchange(String),

    /// AEAD operation failed
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Ticket did not authenticate under the derived key
    #[error("authentication failed")]
    Authentication,

    /// Time source returned an unusable value
    #[error("clock error: {0}")]
    Clock(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid message format
    #[error("invalid message format: {0}")]
    InvalidMessage(String),

    /// Buffer overflow/underflow
    #[error("buffer error: expected {expected} bytes, got {actual}")]
    Buffer {
        /// Required length
        expected: usize,
        /// Length supplied
        actual: usize,
    },
}

impl Error {
    /// Create a new entropy error
    pub fn entropy(msg: impl Into<String>) -> Self {
        Error::Entropy(msg.into())
    }

    /// Create a new key exchange error
    pub fn key_exchange(msg: impl Into<String>) -> Self {
        Error::KeyExchange(msg.into())
    }

    /// Create a new cryptographic error
    pub fn crypto(msg: impl Into<String>) -> Self {
        Error::Crypto(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this error must abort the connection attempt.
    ///
    /// Every failure while producing a token is fatal for the calling
    /// session; only input errors on the opening side are not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Entropy(_) | Error::KeyExchange(_) | Error::Crypto(_) | Error::Clock(_)
        )
    }

    /// Check if this error indicates authentication failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::Authentication)
    }
}
