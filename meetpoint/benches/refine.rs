use criterion::{black_box, criterion_group, criterion_main, Criterion};

use meetpoint::{report, Coordinate, GreatCircleOracle, MeetingPlanner, MidpointRefiner};

/// Points scattered over a rough 2° square around central Pennsylvania.
fn scattered(n: usize) -> Vec<Coordinate> {
    (0..n)
        .map(|i| {
            let frac = i as f64 / n as f64;
            let wobble = ((i * 7919) % 100) as f64 / 100.0;
            Coordinate::new(40.0 + frac * 2.0, -78.0 + wobble * 2.0).unwrap()
        })
        .collect()
}

fn bench_refine_small(c: &mut Criterion) {
    let coords = scattered(5);
    let refiner = MidpointRefiner::new(GreatCircleOracle);

    c.bench_function("refine_5_points", |b| {
        b.iter(|| black_box(refiner.refine(black_box(&coords)).unwrap()));
    });
}

fn bench_refine_large(c: &mut Criterion) {
    let coords = scattered(1000);
    let refiner = MidpointRefiner::new(GreatCircleOracle);

    c.bench_function("refine_1000_points", |b| {
        b.iter(|| black_box(refiner.refine(black_box(&coords)).unwrap()));
    });
}

fn bench_report(c: &mut Criterion) {
    let coords = scattered(1000);
    let midpoint = Coordinate::new(41.0, -77.0).unwrap();

    c.bench_function("report_1000_points", |b| {
        b.iter(|| black_box(report(black_box(&coords), midpoint)));
    });
}

fn bench_plan_cached(c: &mut Criterion) {
    let planner = MeetingPlanner::builder().build().unwrap();
    let text = "849VCWC8+R9\n849VCWG9+5X\n87G8Q2PQ+2X\n40.7128,-74.0060\n";

    // Warm the geocode cache
    let _ = planner.plan(text);

    c.bench_function("plan_4_codes_cached", |b| {
        b.iter(|| black_box(planner.plan(black_box(text)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_refine_small,
    bench_refine_large,
    bench_report,
    bench_plan_cached,
);
criterion_main!(benches);
