//! Performance benchmarks for address-cache-lib
//!
//! Run with: cargo bench --package address-cache-lib

use address_cache_lib::{AddressCache, Bbox, Config, Coordinate, RTree};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate address regions of street-to-district size spread over a metro area
fn generate_regions(count: usize, base_lat: f64, base_lon: f64) -> Vec<(Bbox, Coordinate)> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let lat = base_lat + rng.gen_range(0.0f64..0.5);
            let lon = base_lon + rng.gen_range(0.0f64..0.5);
            let half_height = rng.gen_range(0.0005f64..0.0105);
            let half_width = rng.gen_range(0.0005f64..0.0105);
            let bbox = Bbox::new(
                lat - half_height,
                lon - half_width,
                lat + half_height,
                lon + half_width,
            )
            .unwrap();
            (bbox, Coordinate::new(lat, lon).unwrap())
        })
        .collect()
}

/// Generate query points over the same area
fn generate_points(count: usize, base_lat: f64, base_lon: f64) -> Vec<Coordinate> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            Coordinate::new(
                base_lat + rng.gen_range(0.0f64..0.5),
                base_lon + rng.gen_range(0.0f64..0.5),
            )
            .unwrap()
        })
        .collect()
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_point_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    let points = generate_points(1_000, -23.8, -46.9);
    group.throughput(Throughput::Elements(points.len() as u64));

    for size in [1_000, 10_000, 50_000] {
        let regions = generate_regions(size, -23.8, -46.9);
        let mut tree = RTree::default();
        for (i, (bbox, _)) in regions.iter().enumerate() {
            tree.insert(*bbox, i);
        }

        group.bench_with_input(BenchmarkId::new("rtree", size), &tree, |b, tree| {
            b.iter(|| {
                points
                    .iter()
                    .filter_map(|point| tree.first_containing(*point))
                    .count()
            });
        });

        // Baseline the index has to beat
        if size <= 10_000 {
            group.bench_with_input(
                BenchmarkId::new("linear_scan", size),
                &regions,
                |b, regions| {
                    b.iter(|| {
                        points
                            .iter()
                            .filter_map(|point| {
                                regions.iter().position(|(bbox, _)| bbox.contains(*point))
                            })
                            .count()
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sample_size(20);

    let regions = generate_regions(10_000, -23.8, -46.9);
    group.throughput(Throughput::Elements(regions.len() as u64));

    for max_children in [4, 8, 16] {
        group.bench_with_input(
            BenchmarkId::new("insert_10k", max_children),
            &max_children,
            |b, &max_children| {
                b.iter(|| {
                    let mut tree = RTree::new(max_children);
                    for (i, (bbox, _)) in regions.iter().enumerate() {
                        tree.insert(*bbox, i);
                    }
                    tree.height()
                });
            },
        );
    }

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    group.sample_size(20);

    let regions = generate_regions(5_000, -23.8, -46.9);
    let points = generate_points(1_000, -23.8, -46.9);

    group.bench_function("store_5k", |b| {
        b.iter(|| {
            let cache = AddressCache::default();
            for (i, (bbox, center)) in regions.iter().enumerate() {
                cache.set(format!("Address {}", i), *bbox, *center).unwrap();
            }
            cache.len()
        });
    });

    let cache = AddressCache::new(Config {
        precision: Some(5),
        ..Config::default()
    });
    for (i, (bbox, center)) in regions.iter().enumerate() {
        cache.set(format!("Address {}", i), *bbox, *center).unwrap();
    }

    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("get_1k_points", |b| {
        b.iter(|| points.iter().filter_map(|point| cache.get(*point)).count());
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_point_queries, bench_construction, bench_cache);

criterion_main!(benches);
