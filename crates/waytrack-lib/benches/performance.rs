//! Performance benchmarks for waytrack-lib
//!
//! Run with: cargo bench --package waytrack-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::{Coord, Rect};
use std::hint::black_box;
use waytrack_lib::{
    DistanceMetric, GeoPoint, LocationSample, Polyline, ProximityTracker, SyncConfig,
    TrackingPolicy, ViewportRole, ViewportSync,
};

/// Generate a realistic wiggly path with the specified number of points
fn generate_path(num_points: usize, base_lat: f64, base_lon: f64) -> Polyline {
    let points = (0..num_points)
        .map(|i| {
            let t = i as f64 / num_points as f64;
            let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
            let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
            GeoPoint::new(lat, lon)
        })
        .collect();
    Polyline::new(points).unwrap()
}

fn bench_closest_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("closest_point");

    for num_points in [100, 10_000, 100_000] {
        let path = generate_path(num_points, 51.5, -0.1);
        let query = GeoPoint::new(51.55, -0.05);
        group.throughput(Throughput::Elements(num_points as u64));

        for metric in [DistanceMetric::Planar, DistanceMetric::Geodesic] {
            group.bench_with_input(
                BenchmarkId::new(format!("{metric:?}"), num_points),
                &path,
                |b, path| b.iter(|| path.closest_point(black_box(query), metric)),
            );
        }
    }

    group.finish();
}

fn bench_tracker_samples(c: &mut Criterion) {
    let path = generate_path(10_000, 51.5, -0.1);
    let samples: Vec<LocationSample> = path
        .points()
        .iter()
        .step_by(100)
        .map(|p| LocationSample::new(GeoPoint::new(p.lat + 0.00001, p.lon), 5.0))
        .collect();
    let policy = TrackingPolicy {
        enabled: true,
        ..TrackingPolicy::default()
    };

    c.bench_function("tracker/replay_100_samples", |b| {
        b.iter(|| {
            let mut tracker = ProximityTracker::new(path.clone(), policy).unwrap();
            for sample in &samples {
                tracker.process_sample(black_box(*sample));
            }
            tracker.state()
        })
    });
}

fn bench_marker_refresh(c: &mut Criterion) {
    let region = generate_path(100, 51.5, -0.1).framing_region(1.25).unwrap();
    let frame = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1024.0, y: 768.0 });
    let mut sync = ViewportSync::new(region, frame, frame, SyncConfig::default()).unwrap();

    c.bench_function("sync/on_viewport_changed", |b| {
        b.iter(|| *sync.on_viewport_changed(black_box(ViewportRole::Detail)))
    });
}

criterion_group!(
    benches,
    bench_closest_point,
    bench_tracker_samples,
    bench_marker_refresh
);
criterion_main!(benches);
