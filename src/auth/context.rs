//! Per-session identity and configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::auth::clock::{unix_seconds, Clock, SystemClock};
use crate::auth::config::AuthConfig;
use crate::auth::key_cache::EphemeralKeyCache;
use crate::auth::{PROXY_METHOD_SIZE, SESSION_KEY_SIZE, UID_SIZE};
use crate::crypto::{random_bytes, EntropySource, OsEntropy, PublicKey};
use crate::error::{Error, Result};

/// Cipher the server should use for the session's tunneled traffic.
///
/// Carried as a single byte inside the session ticket. This crate only
/// transports the choice; ticket sealing always uses AES-256-GCM.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionMethod {
    /// No payload encryption beyond the outer transport
    Plain = 0,
    /// AES-256-GCM
    AesGcm = 1,
    /// ChaCha20-Poly1305
    Chacha20Poly1305 = 2,
}

impl EncryptionMethod {
    /// Wire value of this method.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EncryptionMethod {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(EncryptionMethod::Plain),
            1 => Ok(EncryptionMethod::AesGcm),
            2 => Ok(EncryptionMethod::Chacha20Poly1305),
            other => Err(Error::InvalidMessage(format!(
                "unknown encryption method {}",
                other
            ))),
        }
    }
}

impl FromStr for EncryptionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(EncryptionMethod::Plain),
            "aes-gcm" => Ok(EncryptionMethod::AesGcm),
            "chacha20-poly1305" => Ok(EncryptionMethod::Chacha20Poly1305),
            other => Err(Error::config(format!("unknown encryption method '{}'", other))),
        }
    }
}

/// Fixed-width label naming the proxy behaviour a session asks for.
///
/// Shorter labels are zero-padded on the right.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyMethod([u8; PROXY_METHOD_SIZE]);

impl ProxyMethod {
    /// Build a label from a string of at most 16 bytes.
    pub fn new(label: &str) -> Result<Self> {
        let bytes = label.as_bytes();
        if bytes.len() > PROXY_METHOD_SIZE {
            return Err(Error::config(format!(
                "proxy method '{}' exceeds {} bytes",
                label, PROXY_METHOD_SIZE
            )));
        }
        let mut padded = [0u8; PROXY_METHOD_SIZE];
        padded[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(padded))
    }

    /// Wrap an already padded label as read off the wire.
    pub fn from_bytes(bytes: [u8; PROXY_METHOD_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw padded bytes.
    pub fn as_bytes(&self) -> &[u8; PROXY_METHOD_SIZE] {
        &self.0
    }

    /// The label without trailing zero padding, lossily decoded.
    pub fn label(&self) -> String {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.0[..end]).into_owned()
    }
}

impl fmt::Debug for ProxyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProxyMethod").field(&self.label()).finish()
    }
}

/// Values that identify a session to the server.
///
/// Everything here ends up in the ticket plaintext.
#[derive(Clone)]
pub struct SessionParams {
    /// Client identifier
    pub identity: [u8; UID_SIZE],
    /// Server's long-term X25519 public key
    pub static_peer_public_key: PublicKey,
    /// Identifier chosen once when the session starts
    pub session_id: u32,
    /// Requested proxy behaviour
    pub proxy_method: ProxyMethod,
    /// Cipher for tunneled traffic
    pub encryption_method: EncryptionMethod,
    /// Symmetric key handed to the server
    pub session_key: Zeroizing<[u8; SESSION_KEY_SIZE]>,
    /// Width in seconds of the ephemeral-key time bucket
    pub ticket_time_hint: u64,
}

/// Identity, configuration and shared state for one logical session.
///
/// The ticket plaintext fields are fixed at construction and cannot be
/// changed afterwards. Tickets built within one time bucket reuse a key
/// and nonce, which is only safe while the plaintext stays the same.
/// See [`SessionContext::with_key_cache`] for what that means when a cache
/// is shared.
pub struct SessionContext {
    identity: [u8; UID_SIZE],
    static_peer_public_key: PublicKey,
    session_id: u32,
    proxy_method: ProxyMethod,
    encryption_method: EncryptionMethod,
    session_key: Zeroizing<[u8; SESSION_KEY_SIZE]>,
    ticket_time_hint: u64,
    key_cache: Arc<EphemeralKeyCache>,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
}

impl SessionContext {
    /// Create a context using the system clock, OS entropy and a private
    /// key cache.
    pub fn new(params: SessionParams) -> Result<Self> {
        if params.ticket_time_hint == 0 {
            return Err(Error::config("ticket_time_hint must be non-zero"));
        }

        Ok(Self {
            identity: params.identity,
            static_peer_public_key: params.static_peer_public_key,
            session_id: params.session_id,
            proxy_method: params.proxy_method,
            encryption_method: params.encryption_method,
            session_key: params.session_key,
            ticket_time_hint: params.ticket_time_hint,
            key_cache: Arc::new(EphemeralKeyCache::new()),
            clock: Arc::new(SystemClock),
            entropy: Arc::new(OsEntropy),
        })
    }

    /// Create a context from client configuration.
    ///
    /// The session identifier and session key are drawn from `entropy`,
    /// which the context then keeps for all later randomness.
    pub fn from_config(config: &AuthConfig, entropy: Arc<dyn EntropySource>) -> Result<Self> {
        config.validate().map_err(Error::config)?;

        let session_id = u32::from_be_bytes(random_bytes::<4>(entropy.as_ref())?);
        let mut session_key = Zeroizing::new([0u8; SESSION_KEY_SIZE]);
        entropy.fill(&mut session_key[..])?;

        let params = SessionParams {
            identity: config.uid,
            static_peer_public_key: config.public_key(),
            session_id,
            proxy_method: ProxyMethod::new(&config.proxy_method)?,
            encryption_method: config.encryption_method,
            session_key,
            ticket_time_hint: config.ticket_time_hint,
        };

        Ok(Self::new(params)?.with_entropy(entropy))
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the randomness source.
    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    /// Share an ephemeral key cache with other contexts.
    ///
    /// Contexts sharing a cache use the same ephemeral key pair within a
    /// bucket. Against the same static peer key that means the same AES-GCM
    /// key and nonce, so two such contexts must encode identical ticket
    /// plaintexts. Sharing is only sound between contexts that talk to
    /// different static peer keys, or that are copies of one session. The
    /// cache enforces this: a ticket whose plaintext differs from one
    /// already sealed for the same bucket and static peer key fails with
    /// [`Error::Crypto`] instead of reusing the nonce.
    pub fn with_key_cache(mut self, key_cache: Arc<EphemeralKeyCache>) -> Self {
        self.key_cache = key_cache;
        self
    }

    /// Client identifier.
    pub fn identity(&self) -> &[u8; UID_SIZE] {
        &self.identity
    }

    /// Server's long-term public key.
    pub fn static_peer_public_key(&self) -> &PublicKey {
        &self.static_peer_public_key
    }

    /// Session identifier.
    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    /// Requested proxy behaviour.
    pub fn proxy_method(&self) -> &ProxyMethod {
        &self.proxy_method
    }

    /// Cipher for tunneled traffic.
    pub fn encryption_method(&self) -> EncryptionMethod {
        self.encryption_method
    }

    /// Session key material.
    ///
    /// # Security
    ///
    /// Handle with care - this is secret key material.
    pub fn session_key(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.session_key
    }

    /// Ticket time bucket width in seconds.
    pub fn ticket_time_hint(&self) -> u64 {
        self.ticket_time_hint
    }

    /// The ephemeral key cache backing ticket construction.
    pub fn key_cache(&self) -> &Arc<EphemeralKeyCache> {
        &self.key_cache
    }

    pub(crate) fn entropy(&self) -> &dyn EntropySource {
        self.entropy.as_ref()
    }

    pub(crate) fn now_unix(&self) -> Result<u64> {
        unix_seconds(self.clock.as_ref())
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("identity", &hex::encode(self.identity))
            .field("static_peer_public_key", &self.static_peer_public_key)
            .field("session_id", &self.session_id)
            .field("proxy_method", &self.proxy_method)
            .field("encryption_method", &self.encryption_method)
            .field("ticket_time_hint", &self.ticket_time_hint)
            .field("cached_key_pairs", &self.key_cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::FailingEntropy;

    fn params() -> SessionParams {
        SessionParams {
            identity: [0x11; UID_SIZE],
            static_peer_public_key: PublicKey::from_bytes([9u8; 32]),
            session_id: 42,
            proxy_method: ProxyMethod::new("shadowsocks").unwrap(),
            encryption_method: EncryptionMethod::AesGcm,
            session_key: Zeroizing::new([0x22; SESSION_KEY_SIZE]),
            ticket_time_hint: 3600,
        }
    }

    #[test]
    fn test_zero_time_hint_rejected() {
        let mut p = params();
        p.ticket_time_hint = 0;
        assert!(matches!(SessionContext::new(p), Err(Error::Config(_))));
    }

    #[test]
    fn test_proxy_method_padding() {
        let method = ProxyMethod::new("ssh").unwrap();
        assert_eq!(&method.as_bytes()[..3], b"ssh");
        assert!(method.as_bytes()[3..].iter().all(|&b| b == 0));
        assert_eq!(method.label(), "ssh");

        let full = ProxyMethod::new("0123456789abcdef").unwrap();
        assert_eq!(full.as_bytes(), b"0123456789abcdef");

        assert!(ProxyMethod::new("0123456789abcdefg").is_err());
    }

    #[test]
    fn test_encryption_method_wire_values() {
        for method in [
            EncryptionMethod::Plain,
            EncryptionMethod::AesGcm,
            EncryptionMethod::Chacha20Poly1305,
        ] {
            assert_eq!(EncryptionMethod::try_from(method.as_u8()).unwrap(), method);
        }
        assert!(EncryptionMethod::try_from(3).is_err());
        assert_eq!(
            "chacha20-poly1305".parse::<EncryptionMethod>().unwrap(),
            EncryptionMethod::Chacha20Poly1305
        );
    }

    #[test]
    fn test_accessors() {
        let ctx = SessionContext::new(params()).unwrap();
        assert_eq!(ctx.identity(), &[0x11; UID_SIZE]);
        assert_eq!(ctx.session_id(), 42);
        assert_eq!(ctx.proxy_method().label(), "shadowsocks");
        assert_eq!(ctx.encryption_method(), EncryptionMethod::AesGcm);
        assert_eq!(ctx.session_key(), &[0x22; SESSION_KEY_SIZE]);
        assert_eq!(ctx.ticket_time_hint(), 3600);
        assert!(ctx.key_cache().is_empty());
    }

    #[test]
    fn test_debug_redacts_session_key() {
        let ctx = SessionContext::new(params()).unwrap();
        let debug = format!("{:?}", ctx);
        assert!(debug.contains("session_id: 42"));
        assert!(!debug.contains(&hex::encode([0x22; SESSION_KEY_SIZE])));
    }

    #[test]
    fn test_shared_key_cache() {
        let cache = Arc::new(EphemeralKeyCache::new());
        let a = SessionContext::new(params())
            .unwrap()
            .with_key_cache(Arc::clone(&cache));
        let b = SessionContext::new(params())
            .unwrap()
            .with_key_cache(Arc::clone(&cache));
        assert!(Arc::ptr_eq(a.key_cache(), b.key_cache()));
    }

    #[test]
    fn test_from_config_propagates_entropy_failure() {
        let config = AuthConfig::new([1u8; UID_SIZE], [9u8; 32], "shadowsocks");
        let result = SessionContext::from_config(&config, Arc::new(FailingEntropy));
        assert!(matches!(result, Err(Error::Entropy(_))));
    }

    struct SequenceEntropy;

    impl EntropySource for SequenceEntropy {
        fn fill(&self, dest: &mut [u8]) -> Result<()> {
            for (i, b) in dest.iter_mut().enumerate() {
                *b = i as u8;
            }
            Ok(())
        }
    }

    #[test]
    fn test_from_config_draws_key_into_params_unchanged() {
        let config = AuthConfig::new([1u8; UID_SIZE], [9u8; 32], "shadowsocks");
        let ctx = SessionContext::from_config(&config, Arc::new(SequenceEntropy)).unwrap();

        let expected: [u8; SESSION_KEY_SIZE] = core::array::from_fn(|i| i as u8);
        assert_eq!(ctx.session_key(), &expected);
        assert_eq!(ctx.session_id(), 0x0001_0203);

        let params = params();
        let copy = params.clone();
        assert_eq!(*copy.session_key, *params.session_key);
    }

    #[test]
    fn test_from_config() {
        let config = AuthConfig::new([1u8; UID_SIZE], [9u8; 32], "shadowsocks");
        let ctx = SessionContext::from_config(&config, Arc::new(OsEntropy)).unwrap();
        assert_eq!(ctx.identity(), &[1u8; UID_SIZE]);
        assert_eq!(ctx.static_peer_public_key().as_bytes(), &[9u8; 32]);
        assert_eq!(ctx.proxy_method().label(), "shadowsocks");
        assert_ne!(ctx.session_key(), &[0u8; SESSION_KEY_SIZE]);
    }
}
