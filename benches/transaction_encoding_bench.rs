//! 交易编码基准测试
//! 使用criterion进行性能测试

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ledger_signer::domain::{
    transaction::validate_chain_id, TransactionDefaults, TransactionParams, WanTransaction,
};

fn sample_params() -> TransactionParams {
    TransactionParams::new("0x1234567890123456789012345678901234567890")
        .with_nonce(12)
        .with_value("1000000000000000000")
        .with_data(format!("0xa9059cbb{}", "00".repeat(64)))
}

fn bench_unsigned_encoding(c: &mut Criterion) {
    let params = sample_params();
    let defaults = TransactionDefaults::default();

    c.bench_function("build_and_encode_unsigned", |b| {
        b.iter(|| {
            let mut tx = WanTransaction::from_params(black_box(&params), &defaults).unwrap();
            tx.set_replay_protection(black_box(3));
            black_box(tx.encode_hex())
        })
    });
}

fn bench_signed_round_trip(c: &mut Criterion) {
    let mut tx = WanTransaction::from_params(&sample_params(), &TransactionDefaults::default())
        .unwrap();
    tx.set_replay_protection(3);
    tx.apply_signature("29", &"11".repeat(32), &"22".repeat(32))
        .unwrap();
    let encoded = tx.encode();

    c.bench_function("decode_and_validate_signed", |b| {
        b.iter(|| {
            let decoded = WanTransaction::decode(black_box(&encoded)).unwrap();
            validate_chain_id(3, &decoded.v).unwrap();
            black_box(decoded.hash())
        })
    });
}

criterion_group!(benches, bench_unsigned_encoding, bench_signed_round_trip);
criterion_main!(benches);
