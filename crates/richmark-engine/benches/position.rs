use criterion::{Criterion, criterion_group, criterion_main};
use richmark_engine::position::{Direction, bias_to_location, location_to_bias, token_size, word_offset};
mod common;

fn bench_position_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("position");
    group.sample_size(10);

    let root = common::generate_block(100, true);
    let size = token_size(&root);
    let middle = size / 2;

    group.bench_function("bias_to_location", |b| {
        b.iter(|| {
            let location = bias_to_location(std::hint::black_box(&root), std::hint::black_box(middle));
            std::hint::black_box(location);
        });
    });

    let location = bias_to_location(&root, middle).unwrap();
    group.bench_function("location_to_bias", |b| {
        b.iter(|| {
            let bias = location_to_bias(std::hint::black_box(&root), std::hint::black_box(&location));
            std::hint::black_box(bias);
        });
    });

    group.bench_function("token_size", |b| {
        b.iter(|| std::hint::black_box(token_size(std::hint::black_box(&root))));
    });

    group.bench_function("word_offset", |b| {
        b.iter(|| {
            let next = word_offset(&root, std::hint::black_box(&location), Direction::Forward);
            std::hint::black_box(next);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_position_mapping);
criterion_main!(benches);
