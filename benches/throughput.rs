use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nodering::{Heap, RingBuffer};

fn bench_throughput(c: &mut Criterion) {
    let mut ring = RingBuffer::new(&Heap, 1024).unwrap();
    for i in 0..1024u64 {
        ring.enqueue(i);
    }

    c.bench_function("enqueue_overwrite_u64", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = i.wrapping_add(1);
            black_box(ring.enqueue(black_box(i)))
        })
    });

    c.bench_function("enqueue_dequeue_roundtrip_u64", |b| {
        b.iter(|| {
            ring.enqueue(black_box(7));
            black_box(ring.dequeue())
        })
    });

    c.bench_function("average_1024_u64", |b| b.iter(|| black_box(ring.average())));
}

fn bench_resize(c: &mut Criterion) {
    c.bench_function("resize_64_to_128_and_back", |b| {
        let mut ring = RingBuffer::<u64>::new(&Heap, 64).unwrap();
        b.iter(|| {
            ring.resize(128).unwrap();
            ring.resize(64).unwrap();
        })
    });
}

criterion_group!(benches, bench_throughput, bench_resize);
criterion_main!(benches);
