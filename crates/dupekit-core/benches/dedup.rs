//! Benchmarks for fingerprinting and grouping.
//!
//! Run with: cargo bench -p dupekit-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dupekit_core::config::FingerprintConfig;
use dupekit_core::fingerprint::{content, AcousticAnalyzer, ImageHasher};
use dupekit_core::{Category, DuplicateFinder, Fingerprint};
use image::DynamicImage;
use std::collections::HashMap;
use std::path::PathBuf;

fn benchmark_content_hash(c: &mut Criterion) {
    let data = vec![7u8; 4 * 1024 * 1024];

    c.bench_function("content_hash_sha256_4mib", |b| {
        b.iter(|| {
            let _ = content::hash_reader(black_box(data.as_slice()), 64 * 1024);
        })
    });
}

fn benchmark_perceptual_hash(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(256, 256);
    let hasher = ImageHasher::new(8);

    c.bench_function("perceptual_hashes", |b| {
        b.iter(|| {
            let _ = hasher.hash_image(black_box(&img));
        })
    });
}

fn benchmark_acoustic_signature(c: &mut Criterion) {
    let sample_rate = 22_050;
    let samples: Vec<f32> = (0..sample_rate * 5)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (t * 440.0 * std::f32::consts::TAU).sin() * 0.5
        })
        .collect();
    let analyzer = AcousticAnalyzer::new(&FingerprintConfig::default());

    c.bench_function("acoustic_signature_5s", |b| {
        b.iter(|| {
            let _ = analyzer.signature(black_box(&samples), sample_rate as u32);
        })
    });
}

fn benchmark_grouping(c: &mut Criterion) {
    let fingerprints: Vec<Fingerprint> = (0..500u64)
        .map(|i| Fingerprint {
            item_id: format!("/library/{i}.jpg"),
            category: Category::Image,
            content_hash: format!("{:064x}", i % 250),
            perceptual_hash: Some(format!("{:016x}", i.wrapping_mul(0x9e37_79b9_7f4a_7c15))),
            average_hash: None,
            difference_hash: None,
            audio: None,
            file_size: 1024,
            source_path: PathBuf::from(format!("/library/{i}.jpg")),
            degradations: vec![],
        })
        .collect();
    let finder = DuplicateFinder::default();
    let metadata = HashMap::new();

    c.bench_function("find_duplicates_500", |b| {
        b.iter(|| {
            let _ = finder.find_duplicates(black_box(&fingerprints), &metadata);
        })
    });
}

criterion_group!(
    benches,
    benchmark_content_hash,
    benchmark_perceptual_hash,
    benchmark_acoustic_signature,
    benchmark_grouping,
);
criterion_main!(benches);
