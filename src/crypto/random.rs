//! Random byte sources.
//!
//! Two kinds of randomness are used when building tokens:
//!
//! - unpredictable bytes from an injectable [`EntropySource`] (the OS by
//!   default) for key generation and the random field;
//! - reproducible pseudo-random bytes from a seeded generator for ticket
//!   padding, which must be stable within a time bucket.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_core::OsRng;

use crate::error::{Error, Result};

/// A source of cryptographically secure random bytes.
///
/// Implementations must be safe to share between threads; the session
/// context hands the same source to every token it builds.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with random bytes, or fail without partial use.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// Entropy from the operating system (e.g. getrandom(2) on Linux,
/// BCryptGenRandom on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::entropy(e.to_string()))
    }
}

/// Draw a fixed-size array of random bytes from `source`.
pub fn random_bytes<const N: usize>(source: &dyn EntropySource) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    source.fill(&mut buf)?;
    Ok(buf)
}

/// Fill `dest` with pseudo-random bytes fully determined by `seed`.
///
/// Not suitable for secrets: anyone who knows the seed can reproduce the
/// output. Used where bytes must look random yet repeat for equal seeds.
pub fn fill_seeded(dest: &mut [u8], seed: u64) {
    StdRng::seed_from_u64(seed).fill_bytes(dest);
}
