#![cfg(feature = "benchmarks")]

use criterion::{criterion_group, criterion_main};
use triedb::node::benches::node_benchmark;

criterion_group!(benches, node_benchmark);
criterion_main!(benches);
