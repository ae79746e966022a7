//! Per-bucket ephemeral key pairs.
//!
//! Every ticket built within one time bucket carries the same ephemeral
//! public key. The cache creates that key pair on first demand and hands
//! out shared references afterwards. Retiring old buckets is left to the
//! owner of the cache.
//!
//! A bucket's pair together with a static peer key fixes both the AES-GCM
//! key and the nonce of a ticket. The cache therefore also records a digest
//! of the plaintext sealed for each static peer key in a bucket, and
//! refuses to hand the pair out for a different plaintext.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::crypto::{EntropySource, EphemeralKeyPair, PublicKey, PUBLIC_KEY_SIZE};
use crate::error::{Error, Result};

/// SHA-256 digest of a ticket plaintext.
pub(crate) type PlaintextDigest = [u8; 32];

#[derive(Debug)]
struct BucketEntry {
    pair: Arc<EphemeralKeyPair>,
    sealed: HashMap<[u8; PUBLIC_KEY_SIZE], PlaintextDigest>,
}

/// Map from time-bucket index to the ephemeral key pair for that bucket.
///
/// One cache may back several [`SessionContext`]s. Within a bucket, all
/// contexts that seal tickets for the same static peer key must encode the
/// same plaintext, since they share the AEAD key and nonce. Ticket
/// construction checks this and fails with [`Error::Crypto`] on a mismatch.
/// Callers using [`EphemeralKeyCache::get_or_create`] directly bypass that
/// check and take on the same obligation.
///
/// [`SessionContext`]: crate::auth::SessionContext
#[derive(Debug, Default)]
pub struct EphemeralKeyCache {
    buckets: Mutex<HashMap<u64, BucketEntry>>,
}

impl EphemeralKeyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the key pair for `bucket`, generating it if this is the
    /// first request for that bucket.
    ///
    /// Lookup and insertion happen under one lock, so concurrent callers
    /// for the same bucket all receive the pair created by the first.
    pub fn get_or_create(
        &self,
        bucket: u64,
        entropy: &dyn EntropySource,
    ) -> Result<Arc<EphemeralKeyPair>> {
        let mut buckets = self.buckets.lock();
        let entry = bucket_entry(&mut buckets, bucket, entropy)?;
        Ok(Arc::clone(&entry.pair))
    }

    /// Like [`get_or_create`](Self::get_or_create), but also binds the
    /// plaintext about to be sealed for `peer` in this bucket.
    ///
    /// The first digest recorded for a `(bucket, peer)` pair wins; a
    /// different digest afterwards is rejected.
    pub(crate) fn get_for_plaintext(
        &self,
        bucket: u64,
        peer: &PublicKey,
        digest: PlaintextDigest,
        entropy: &dyn EntropySource,
    ) -> Result<Arc<EphemeralKeyPair>> {
        let mut buckets = self.buckets.lock();
        let entry = bucket_entry(&mut buckets, bucket, entropy)?;

        match entry.sealed.entry(peer.to_bytes()) {
            Entry::Occupied(sealed) if *sealed.get() != digest => {
                tracing::warn!(bucket, "ticket plaintext changed within bucket");
                return Err(Error::crypto(
                    "a different ticket plaintext was already sealed for this peer key in this bucket",
                ));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(digest);
            }
        }

        Ok(Arc::clone(&entry.pair))
    }

    /// Whether a key pair exists for `bucket`.
    pub fn contains(&self, bucket: u64) -> bool {
        self.buckets.lock().contains_key(&bucket)
    }

    /// Drop the key pair for `bucket`. Returns whether one was present.
    ///
    /// Tickets already built keep working; a later request for the same
    /// bucket generates a new pair and forgets which plaintexts were sealed.
    pub fn retire(&self, bucket: u64) -> bool {
        self.buckets.lock().remove(&bucket).is_some()
    }

    /// Number of cached buckets.
    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    /// Whether the cache holds no key pairs.
    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }
}

fn bucket_entry<'a>(
    buckets: &'a mut HashMap<u64, BucketEntry>,
    bucket: u64,
    entropy: &dyn EntropySource,
) -> Result<&'a mut BucketEntry> {
    match buckets.entry(bucket) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(slot) => {
            let pair = Arc::new(EphemeralKeyPair::generate(entropy)?);
            tracing::debug!(bucket, "created ephemeral key pair");
            Ok(slot.insert(BucketEntry {
                pair,
                sealed: HashMap::new(),
            }))
        }
    }
}
