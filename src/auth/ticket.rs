//! Session ticket construction and opening.
//!
//! Layout (192 bytes, the size of a typical TLS session ticket):
//!
//! ```text
//! [0..32)    ephemeral X25519 public key of the current time bucket
//! [32..117)  AES-256-GCM(plaintext), 69 bytes + 16-byte tag
//! [117..192) padding from a PRNG seeded with bucket + session_id
//! ```
//!
//! Plaintext (69 bytes, integers big-endian):
//!
//! ```text
//! [0..16)  identity
//! [16..20) session_id
//! [20..36) proxy method label
//! [36]     encryption method
//! [37..69) session key
//! ```
//!
//! The AEAD key is the X25519 shared secret between the bucket's ephemeral
//! key and the server's static key; the nonce is the first 12 bytes of the
//! ephemeral public key. The server can therefore derive both from the
//! ticket alone. Within a bucket the same key and nonce are reused for a
//! given static peer key, so every ticket sealed under them must carry the
//! same plaintext. A session's own fields are fixed, which covers repeated
//! tickets from one context. Contexts sharing an [`EphemeralKeyCache`] are
//! covered by the cache itself: it records a digest of the plaintext sealed
//! per bucket and static peer key, and a ticket with a different plaintext
//! fails with [`Error::Crypto`] before anything is encrypted. Different
//! servers have different static keys and so never share a derived key,
//! even though the nonce is public.
//!
//! The padding seed mixes in the session id so clients active in the same
//! bucket do not emit identical padding. Padding is still stable per client
//! per bucket, so repeated tickets from one session are byte-identical.
//!
//! [`EphemeralKeyCache`]: crate::auth::EphemeralKeyCache

use std::fmt;
use std::ops::Range;

use bytes::{Buf, BufMut};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::auth::clock::time_bucket;
use crate::auth::context::{EncryptionMethod, ProxyMethod, SessionContext};
use crate::auth::{PROXY_METHOD_SIZE, SESSION_KEY_SIZE, SESSION_TICKET_SIZE, UID_SIZE};
use crate::crypto::{
    ciphertext_len, fill_seeded, Aead, Nonce, PublicKey, StaticSecret, PUBLIC_KEY_SIZE,
};
use crate::error::{Error, Result};

/// Length of the encrypted ticket plaintext.
pub const TICKET_PLAINTEXT_SIZE: usize = UID_SIZE + 4 + PROXY_METHOD_SIZE + 1 + SESSION_KEY_SIZE;

const SEALED_SIZE: usize = ciphertext_len(TICKET_PLAINTEXT_SIZE);

const PUBLIC_KEY_RANGE: Range<usize> = 0..PUBLIC_KEY_SIZE;
const SEALED_RANGE: Range<usize> = PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + SEALED_SIZE;
const PADDING_RANGE: Range<usize> = PUBLIC_KEY_SIZE + SEALED_SIZE..SESSION_TICKET_SIZE;

/// Build the session ticket for the current time bucket.
///
/// Fails with [`Error::Crypto`] if a context sharing this one's key cache
/// already sealed a different plaintext for the same static peer key in
/// the current bucket.
pub fn make_session_ticket(ctx: &SessionContext) -> Result<[u8; SESSION_TICKET_SIZE]> {
    let bucket = time_bucket(ctx.now_unix()?, ctx.ticket_time_hint());
    let plaintext = encode_plaintext(ctx);
    let digest: [u8; 32] = Sha256::digest(&plaintext[..]).into();
    let pair = ctx.key_cache().get_for_plaintext(
        bucket,
        ctx.static_peer_public_key(),
        digest,
        ctx.entropy(),
    )?;

    let mut ticket = [0u8; SESSION_TICKET_SIZE];
    ticket[PUBLIC_KEY_RANGE].copy_from_slice(pair.public().as_bytes());

    let key = pair
        .diffie_hellman(ctx.static_peer_public_key())?
        .to_aead_key();
    let nonce = Nonce::from_prefix(pair.public().as_bytes())?;

    let sealed = Aead::new(&key).encrypt(&nonce, &plaintext, &[])?;
    if sealed.len() != SEALED_SIZE {
        return Err(Error::crypto(format!(
            "sealed ticket payload is {} bytes, expected {}",
            sealed.len(),
            SEALED_SIZE
        )));
    }
    ticket[SEALED_RANGE].copy_from_slice(&sealed);

    fill_seeded(
        &mut ticket[PADDING_RANGE],
        bucket.wrapping_add(u64::from(ctx.session_id())),
    );

    tracing::trace!(bucket, session_id = ctx.session_id(), "built session ticket");
    Ok(ticket)
}

fn encode_plaintext(ctx: &SessionContext) -> Zeroizing<Vec<u8>> {
    let mut buf = Zeroizing::new(Vec::with_capacity(TICKET_PLAINTEXT_SIZE));
    buf.put_slice(ctx.identity());
    buf.put_u32(ctx.session_id());
    buf.put_slice(ctx.proxy_method().as_bytes());
    buf.put_u8(ctx.encryption_method().as_u8());
    buf.put_slice(ctx.session_key());
    buf
}

/// Fields recovered from a session ticket.
#[derive(Clone, PartialEq, Eq)]
pub struct TicketPayload {
    /// Client identifier
    pub identity: [u8; UID_SIZE],
    /// Session identifier
    pub session_id: u32,
    /// Requested proxy behaviour
    pub proxy_method: ProxyMethod,
    /// Cipher for tunneled traffic
    pub encryption_method: EncryptionMethod,
    /// Session key material
    pub session_key: Zeroizing<[u8; SESSION_KEY_SIZE]>,
}

impl fmt::Debug for TicketPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketPayload")
            .field("identity", &hex::encode(self.identity))
            .field("session_id", &self.session_id)
            .field("proxy_method", &self.proxy_method)
            .field("encryption_method", &self.encryption_method)
            .finish_non_exhaustive()
    }
}

impl TicketPayload {
    fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() != TICKET_PLAINTEXT_SIZE {
            return Err(Error::Buffer {
                expected: TICKET_PLAINTEXT_SIZE,
                actual: buf.len(),
            });
        }

        let mut identity = [0u8; UID_SIZE];
        buf.copy_to_slice(&mut identity);
        let session_id = buf.get_u32();
        let mut proxy_method = [0u8; PROXY_METHOD_SIZE];
        buf.copy_to_slice(&mut proxy_method);
        let encryption_method = EncryptionMethod::try_from(buf.get_u8())?;
        let mut session_key = Zeroizing::new([0u8; SESSION_KEY_SIZE]);
        buf.copy_to_slice(&mut session_key[..]);

        Ok(Self {
            identity,
            session_id,
            proxy_method: ProxyMethod::from_bytes(proxy_method),
            encryption_method,
            session_key,
        })
    }
}

/// Recover the payload of a session ticket using the server's static key.
///
/// Padding is not checked. A ticket that fails to decrypt is reported as
/// [`Error::Authentication`].
pub fn open_session_ticket(static_secret: &StaticSecret, ticket: &[u8]) -> Result<TicketPayload> {
    if ticket.len() != SESSION_TICKET_SIZE {
        return Err(Error::Buffer {
            expected: SESSION_TICKET_SIZE,
            actual: ticket.len(),
        });
    }

    let ephemeral_public = PublicKey::from_slice(&ticket[PUBLIC_KEY_RANGE])?;
    let key = static_secret
        .diffie_hellman(&ephemeral_public)?
        .to_aead_key();
    let nonce = Nonce::from_prefix(&ticket[PUBLIC_KEY_RANGE])?;

    let plaintext = Aead::new(&key)
        .decrypt(&nonce, &ticket[SEALED_RANGE], &[])
        .map(Zeroizing::new)
        .map_err(|_| Error::Authentication)?;

    TicketPayload::decode(&plaintext)
}
