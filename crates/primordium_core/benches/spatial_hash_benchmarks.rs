use criterion::{black_box, criterion_group, criterion_main, Criterion};
use primordium_core::spatial_grid::SpatialGrid;
use primordium_data::Position;
use uuid::Uuid;

fn sample_positions(count: usize) -> Vec<(Uuid, Position)> {
    (0..count)
        .map(|i| {
            let x = (i % 100) as f64 * 10.0;
            let y = (i / 100) as f64 * 10.0;
            (Uuid::new_v4(), Position { x, y })
        })
        .collect()
}

fn bench_spatial_grid_rebuild(c: &mut Criterion) {
    let positions = sample_positions(1000);

    c.bench_function("spatial_grid_rebuild_1000", |b| {
        b.iter(|| {
            let mut grid = SpatialGrid::new(10.0);
            grid.rebuild(positions.iter().copied());
            black_box(&grid)
        })
    });
}

fn bench_spatial_grid_query_radius(c: &mut Criterion) {
    let positions = sample_positions(1000);
    let mut grid = SpatialGrid::new(10.0);
    grid.rebuild(positions.iter().copied());

    c.bench_function("spatial_grid_query_50_radius", |b| {
        b.iter(|| {
            let results = grid.query_radius(Position { x: 500.0, y: 500.0 }, 50.0);
            black_box(results.len())
        })
    });
}

fn bench_spatial_grid_query_radius_small(c: &mut Criterion) {
    let positions = sample_positions(1000);
    let mut grid = SpatialGrid::new(10.0);
    grid.rebuild(positions.iter().copied());

    c.bench_function("spatial_grid_query_10_radius", |b| {
        b.iter(|| {
            let results = grid.query_radius(Position { x: 500.0, y: 500.0 }, 10.0);
            black_box(results.len())
        })
    });
}

fn bench_spatial_grid_update_position(c: &mut Criterion) {
    let positions = sample_positions(1000);
    let mut grid = SpatialGrid::new(10.0);
    grid.rebuild(positions.iter().copied());
    let (moving_id, _) = positions[0];

    c.bench_function("spatial_grid_update_position", |b| {
        let mut toggle = 0.0;
        b.iter(|| {
            toggle = if toggle == 0.0 { 500.0 } else { 0.0 };
            grid.update_position(moving_id, Position { x: toggle, y: toggle });
            black_box(toggle)
        })
    });
}

criterion_group!(
    benches,
    bench_spatial_grid_rebuild,
    bench_spatial_grid_query_radius,
    bench_spatial_grid_query_radius_small,
    bench_spatial_grid_update_position
);
criterion_main!(benches);
