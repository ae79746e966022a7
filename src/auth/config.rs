//! Client authentication configuration.

use serde::{Deserialize, Serialize};

use crate::auth::context::EncryptionMethod;
use crate::auth::{PROXY_METHOD_SIZE, UID_SIZE};
use crate::crypto::PublicKey;

/// Default ticket time bucket width: one hour.
pub const DEFAULT_TICKET_TIME_HINT: u64 = 3600;

/// Configuration for building covert tokens.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Client identifier (16 bytes, base64-encoded for config files)
    #[serde(with = "base64_bytes")]
    pub uid: [u8; UID_SIZE],

    /// Server's static public key (X25519, base64-encoded for config files)
    #[serde(with = "base64_bytes")]
    pub public_key: [u8; 32],

    /// Proxy method label, at most 16 bytes (e.g. "shadowsocks")
    pub proxy_method: String,

    /// Cipher for tunneled traffic
    #[serde(default = "default_encryption_method")]
    pub encryption_method: EncryptionMethod,

    /// Ephemeral key bucket width in seconds
    #[serde(default = "default_ticket_time_hint")]
    pub ticket_time_hint: u64,
}

fn default_encryption_method() -> EncryptionMethod {
    EncryptionMethod::AesGcm
}

fn default_ticket_time_hint() -> u64 {
    DEFAULT_TICKET_TIME_HINT
}

impl AuthConfig {
    /// Create a new configuration with default cipher and time hint.
    pub fn new(uid: [u8; UID_SIZE], public_key: [u8; 32], proxy_method: impl Into<String>) -> Self {
        Self {
            uid,
            public_key,
            proxy_method: proxy_method.into(),
            encryption_method: default_encryption_method(),
            ticket_time_hint: DEFAULT_TICKET_TIME_HINT,
        }
    }

    /// Get the server's public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.public_key)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.proxy_method.is_empty() {
            return Err("proxy_method cannot be empty".to_string());
        }
        if self.proxy_method.len() > PROXY_METHOD_SIZE {
            return Err(format!(
                "proxy_method cannot exceed {} bytes",
                PROXY_METHOD_SIZE
            ));
        }
        if self.public_key == [0u8; 32] {
            return Err("public_key cannot be all zeros".to_string());
        }
        if self.ticket_time_hint == 0 {
            return Err("ticket_time_hint must be non-zero".to_string());
        }
        Ok(())
    }
}

// Custom serde helper for fixed-size byte arrays
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = STANDARD.decode(&s).map_err(serde::de::Error::custom)?;
        let len = bytes.len();
        bytes.try_into().map_err(|_| {
            serde::de::Error::custom(format!("expected {} bytes, got {}", N, len))
        })
    }
}
