use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    http::bench_accumulate,
    http::bench_deliver_once,
    http::bench_stream_dispatch,
    http::bench_fill_buffer
);
criterion_main!(benches);
