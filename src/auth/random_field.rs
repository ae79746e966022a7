//! Disguised ClientHello random field.
//!
//! Layout (32 bytes):
//!
//! ```text
//! [0..16)  rdm     - fresh random bytes
//! [16..32) digest  - SHA-256(identity padded to 32 || bucket_be64 || rdm)[..16]
//! ```
//!
//! The bucket is the 12-hour interval containing the current time. A holder
//! of the identity can recompute the digest from `rdm`; to anyone else both
//! halves look uniformly random.

use sha2::{Digest, Sha256};

use crate::auth::clock::time_bucket;
use crate::auth::context::SessionContext;
use crate::auth::{RANDOM_FIELD_BUCKET_SECS, RANDOM_FIELD_SIZE, UID_SIZE};
use crate::crypto::random_bytes;
use crate::error::Result;

const RDM_SIZE: usize = 16;
const DIGEST_PREFIX_SIZE: usize = RANDOM_FIELD_SIZE - RDM_SIZE;
const PREIMAGE_IDENTITY_WIDTH: usize = 32;
const PREIMAGE_SIZE: usize = PREIMAGE_IDENTITY_WIDTH + 8 + RDM_SIZE;

/// Build a random field for the context's identity at the current time.
pub fn make_random_field(ctx: &SessionContext) -> Result<[u8; RANDOM_FIELD_SIZE]> {
    let bucket = time_bucket(ctx.now_unix()?, RANDOM_FIELD_BUCKET_SECS);
    let rdm = random_bytes::<RDM_SIZE>(ctx.entropy())?;
    let digest = field_digest(ctx.identity(), bucket, &rdm);

    let mut field = [0u8; RANDOM_FIELD_SIZE];
    field[..RDM_SIZE].copy_from_slice(&rdm);
    field[RDM_SIZE..].copy_from_slice(&digest);
    Ok(field)
}

/// Check a random field against `identity`.
///
/// Tries the bucket containing `unix_secs` and the one before it, so a
/// field built just before a bucket boundary still verifies just after it.
/// Returns the bucket that matched.
pub fn verify_random_field(
    identity: &[u8; UID_SIZE],
    field: &[u8; RANDOM_FIELD_SIZE],
    unix_secs: u64,
) -> Option<u64> {
    let current = time_bucket(unix_secs, RANDOM_FIELD_BUCKET_SECS);
    let rdm: &[u8; RDM_SIZE] = field[..RDM_SIZE].try_into().ok()?;
    let observed = &field[RDM_SIZE..];

    [Some(current), current.checked_sub(1)]
        .into_iter()
        .flatten()
        .find(|&bucket| constant_time_eq(&field_digest(identity, bucket, rdm), observed))
}

fn field_digest(
    identity: &[u8; UID_SIZE],
    bucket: u64,
    rdm: &[u8; RDM_SIZE],
) -> [u8; DIGEST_PREFIX_SIZE] {
    // Identity occupies a 32-byte slot; the unused tail stays zero.
    let mut preimage = [0u8; PREIMAGE_SIZE];
    preimage[..UID_SIZE].copy_from_slice(identity);
    preimage[PREIMAGE_IDENTITY_WIDTH..PREIMAGE_IDENTITY_WIDTH + 8]
        .copy_from_slice(&bucket.to_be_bytes());
    preimage[PREIMAGE_IDENTITY_WIDTH + 8..].copy_from_slice(rdm);

    let hash = Sha256::digest(preimage);
    let mut prefix = [0u8; DIGEST_PREFIX_SIZE];
    prefix.copy_from_slice(&hash[..DIGEST_PREFIX_SIZE]);
    prefix
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use zeroize::Zeroizing;

    use crate::auth::clock::FixedClock;
    use crate::auth::context::{EncryptionMethod, ProxyMethod, SessionParams};
    use crate::crypto::{FailingEntropy, PublicKey};
    use crate::error::Error;

    const NOW: u64 = 1_700_000_000;

    fn context(identity: [u8; UID_SIZE], now: u64) -> SessionContext {
        SessionContext::new(SessionParams {
            identity,
            static_peer_public_key: PublicKey::from_bytes([9u8; 32]),
            session_id: 1,
            proxy_method: ProxyMethod::new("shadowsocks").unwrap(),
            encryption_method: EncryptionMethod::Plain,
            session_key: Zeroizing::new([0u8; 32]),
            ticket_time_hint: 3600,
        })
        .unwrap()
        .with_clock(Arc::new(FixedClock::from_unix(now)))
    }

    #[test]
    fn test_field_size_and_freshness() {
        let ctx = context([7u8; UID_SIZE], NOW);
        let a = make_random_field(&ctx).unwrap();
        let b = make_random_field(&ctx).unwrap();

        assert_eq!(a.len(), RANDOM_FIELD_SIZE);
        assert_ne!(a[..RDM_SIZE], b[..RDM_SIZE]);
        assert_ne!(a[RDM_SIZE..], b[RDM_SIZE..]);
    }

    #[test]
    fn test_digest_matches_manual_computation() {
        let identity = [7u8; UID_SIZE];
        let ctx = context(identity, NOW);
        let field = make_random_field(&ctx).unwrap();

        let mut preimage = Vec::with_capacity(PREIMAGE_SIZE);
        preimage.extend_from_slice(&identity);
        preimage.extend_from_slice(&[0u8; PREIMAGE_IDENTITY_WIDTH - UID_SIZE]);
        preimage.extend_from_slice(&(NOW / 43_200).to_be_bytes());
        preimage.extend_from_slice(&field[..RDM_SIZE]);
        assert_eq!(preimage.len(), 56);

        let hash = Sha256::digest(&preimage);
        assert_eq!(&field[RDM_SIZE..], &hash[..16]);
    }

    #[test]
    fn test_verifies_in_same_bucket() {
        let identity = [3u8; UID_SIZE];
        let field = make_random_field(&context(identity, NOW)).unwrap();

        assert_eq!(
            verify_random_field(&identity, &field, NOW),
            Some(NOW / RANDOM_FIELD_BUCKET_SECS)
        );
    }

    #[test]
    fn test_verifies_across_bucket_boundary() {
        let identity = [3u8; UID_SIZE];
        let boundary = (NOW / RANDOM_FIELD_BUCKET_SECS + 1) * RANDOM_FIELD_BUCKET_SECS;

        let field = make_random_field(&context(identity, boundary - 1)).unwrap();
        assert_eq!(
            verify_random_field(&identity, &field, boundary + 5),
            Some(boundary / RANDOM_FIELD_BUCKET_SECS - 1)
        );

        // Two buckets later the field is stale.
        assert_eq!(
            verify_random_field(&identity, &field, boundary + RANDOM_FIELD_BUCKET_SECS),
            None
        );
    }

    #[test]
    fn test_wrong_identity_does_not_verify() {
        let field = make_random_field(&context([3u8; UID_SIZE], NOW)).unwrap();
        assert_eq!(verify_random_field(&[4u8; UID_SIZE], &field, NOW), None);
    }

    #[test]
    fn test_tampered_field_does_not_verify() {
        let identity = [3u8; UID_SIZE];
        let mut field = make_random_field(&context(identity, NOW)).unwrap();
        field[0] ^= 0x80;
        assert_eq!(verify_random_field(&identity, &field, NOW), None);
    }

    #[test]
    fn test_first_bucket_has_no_predecessor() {
        let identity = [3u8; UID_SIZE];
        let field = make_random_field(&context(identity, 10)).unwrap();
        assert_eq!(verify_random_field(&identity, &field, 20), Some(0));
    }

    #[test]
    fn test_entropy_failure_propagates() {
        let ctx = context([1u8; UID_SIZE], NOW).with_entropy(Arc::new(FailingEntropy));
        assert!(matches!(make_random_field(&ctx), Err(Error::Entropy(_))));
    }
}
