use super::{
    deserialize_node_from_buffer, make_node, serialize_node_to_buffer, ChildData, Node,
    NodeChildren, DISK_SIZE_BYTES, MAX_CHILD_DATA_LEN,
};
use crate::nibbles::NibblesView;
use crate::pool::ChunkOffset;
use criterion::{BatchSize, BenchmarkId, Criterion};
use rand::{Rng, RngCore};

pub fn node_benchmark(c: &mut Criterion) {
    build_benchmark(c);
    roundtrip_benchmark(c);
}

fn staged_children(mask: u16) -> Vec<ChildData> {
    let mut rng = rand::thread_rng();
    NodeChildren::new(mask)
        .map(|(_, branch)| {
            let mut child = ChildData {
                branch,
                len: MAX_CHILD_DATA_LEN as u8,
                offset: ChunkOffset::new(rng.gen_range(0..ChunkOffset::MAX_ID), 0),
                ..ChildData::default()
            };
            rng.fill_bytes(&mut child.data);
            child
        })
        .collect()
}

fn build_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_build");

    for mask in [0x0001u16, 0x00FF, 0xFFFF] {
        let path = [0xAB; 4];
        group.bench_function(BenchmarkId::new("children", mask.count_ones()), |b| {
            b.iter_batched(
                || staged_children(mask),
                |mut children| {
                    make_node(
                        mask,
                        &mut children,
                        NibblesView::from_bytes(&path),
                        Some(b"value"),
                        0,
                        1,
                    )
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn roundtrip_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_roundtrip");

    let mask = 0xFFFFu16;
    let mut children = staged_children(mask);
    let node = make_node(mask, &mut children, NibblesView::EMPTY, None, 0, 1);
    let record_len = node.disk_size() + DISK_SIZE_BYTES;
    let mut record = vec![0u8; record_len];
    serialize_node_to_buffer(&mut record, &node, record_len as u32, 0);

    group.bench_function("serialize_16_children", |b| {
        b.iter(|| serialize_node_to_buffer(&mut record, &node, record_len as u32, 0))
    });
    group.bench_function("deserialize_16_children", |b| {
        b.iter(|| deserialize_node_from_buffer::<Node>(&record))
    });

    group.finish();
}
