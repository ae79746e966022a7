//! # covert-auth
//!
//! Construction of covert client authentication tokens that ride inside
//! ordinary TLS ClientHello fields.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Handshake layer (external caller)            │
//! ├─────────────────────────────────────────────────────────┤
//! │  Auth tokens (random field, session ticket, key cache)  │
//! ├─────────────────────────────────────────────────────────┤
//! │  Crypto Layer (X25519, AES-256-GCM)                     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Goals
//!
//! 1. **Unobservability**: tokens have the exact sizes of the fields they
//!    replace and look uniformly random without the right keys
//! 2. **Server recoverability**: the server needs only its static key and
//!    the client identity to authenticate a client
//! 3. **Injected effects**: time and randomness come from replaceable
//!    sources, so every token is reproducible in tests
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use covert_auth::auth::{make_random_field, make_session_ticket, AuthConfig, SessionContext};
//! use covert_auth::crypto::OsEntropy;
//!
//! # fn main() -> covert_auth::Result<()> {
//! let config = AuthConfig::new([1u8; 16], [2u8; 32], "shadowsocks");
//! let ctx = SessionContext::from_config(&config, Arc::new(OsEntropy))?;
//!
//! let random: [u8; 32] = make_random_field(&ctx)?;
//! let ticket: [u8; 192] = make_session_ticket(&ctx)?;
//! # let _ = (random, ticket);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod auth;
pub mod crypto;
pub mod error;

pub use error::{Error, Result};
