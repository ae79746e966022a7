//! Token construction benchmarks.
//!
//! Tokens are built on every connection attempt, so both operations should
//! stay well below handshake round-trip time.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use zeroize::Zeroizing;

use covert_auth::auth::{
    make_random_field, make_session_ticket, open_session_ticket, EncryptionMethod, FixedClock,
    ProxyMethod, SessionContext, SessionParams,
};
use covert_auth::crypto::{EphemeralKeyPair, OsEntropy, PublicKey, StaticSecret};

fn context(server_public: PublicKey) -> SessionContext {
    SessionContext::new(SessionParams {
        identity: [0x42; 16],
        static_peer_public_key: server_public,
        session_id: 0x1234_5678,
        proxy_method: ProxyMethod::new("shadowsocks").unwrap(),
        encryption_method: EncryptionMethod::AesGcm,
        session_key: Zeroizing::new([0x24; 32]),
        ticket_time_hint: 3600,
    })
    .unwrap()
    .with_clock(Arc::new(FixedClock::from_unix(1_700_000_000)))
}

fn bench_random_field(c: &mut Criterion) {
    let server = StaticSecret::generate(&OsEntropy).unwrap();
    let ctx = context(PublicKey::from(&server));

    c.bench_function("random_field", |b| {
        b.iter(|| black_box(make_random_field(&ctx).unwrap()))
    });
}

fn bench_session_ticket_warm_cache(c: &mut Criterion) {
    let server = StaticSecret::generate(&OsEntropy).unwrap();
    let ctx = context(PublicKey::from(&server));
    // Populate the bucket so only key agreement, AEAD and padding are timed
    make_session_ticket(&ctx).unwrap();

    c.bench_function("session_ticket_warm_cache", |b| {
        b.iter(|| black_box(make_session_ticket(&ctx).unwrap()))
    });
}

fn bench_ephemeral_keygen(c: &mut Criterion) {
    c.bench_function("ephemeral_keygen", |b| {
        b.iter(|| black_box(EphemeralKeyPair::generate(&OsEntropy).unwrap()))
    });
}

fn bench_open_session_ticket(c: &mut Criterion) {
    let server = StaticSecret::generate(&OsEntropy).unwrap();
    let ctx = context(PublicKey::from(&server));
    let ticket = make_session_ticket(&ctx).unwrap();

    c.bench_function("open_session_ticket", |b| {
        b.iter(|| black_box(open_session_ticket(&server, &ticket).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_random_field,
    bench_session_ticket_warm_cache,
    bench_ephemeral_keygen,
    bench_open_session_ticket,
);

criterion_main!(benches);
