//! Covert client authentication tokens.
//!
//! A client proves who it is to a cooperating server using two values that
//! sit in ordinary TLS ClientHello fields, so that an observer sees nothing
//! but a normal handshake:
//!
//! 1. **Random field**: the 32-byte ClientHello random, half fresh
//!    randomness and half a digest binding it to the client identity and a
//!    12-hour time bucket.
//! 2. **Session ticket**: a 192-byte session ticket extension carrying the
//!    client identity and session parameters, encrypted to the server's
//!    static X25519 key through a per-bucket ephemeral key.
//!
//! ## Flow
//!
//! ```text
//! Client                                           Server
//!   |                                                 |
//!   |  random   = make_random_field(ctx)              |
//!   |  ticket   = make_session_ticket(ctx)            |
//!   |                                                 |
//!   |  ClientHello { random, session_ticket: ticket } |
//!   |------------------------------------------------>|
//!   |                                                 |
//!   |                open_session_ticket(static, ticket)
//!   |                verify_random_field(uid, random, now)
//! ```
//!
//! Both operations are synchronous and may be called from any thread. The
//! only shared mutable state is the [`EphemeralKeyCache`].

mod clock;
mod config;
mod context;
mod key_cache;
mod random_field;
mod ticket;

pub use clock::{time_bucket, unix_seconds, Clock, FixedClock, SystemClock};
pub use config::{AuthConfig, DEFAULT_TICKET_TIME_HINT};
pub use context::{EncryptionMethod, ProxyMethod, SessionContext, SessionParams};
pub use key_cache::EphemeralKeyCache;
pub use random_field::{make_random_field, verify_random_field};
pub use ticket::{make_session_ticket, open_session_ticket, TicketPayload, TICKET_PLAINTEXT_SIZE};

/// Size of the client identifier
pub const UID_SIZE: usize = 16;

/// Size of the proxy method label
pub const PROXY_METHOD_SIZE: usize = 16;

/// Size of the session key carried in the ticket
pub const SESSION_KEY_SIZE: usize = 32;

/// Size of the disguised ClientHello random
pub const RANDOM_FIELD_SIZE: usize = 32;

/// Size of the disguised session ticket
pub const SESSION_TICKET_SIZE: usize = 192;

/// Width of the random field's time bucket: 12 hours
pub const RANDOM_FIELD_BUCKET_SECS: u64 = 12 * 60 * 60;
