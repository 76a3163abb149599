use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use map_collage::{Coords, IslandBuilder, Tile, TileGrid};

/// A large ragged blob: left-aligned rows of varying width, so the region
/// is one connected island with a jagged (but hole-free) boundary
fn blob(side: i64) -> Vec<Tile> {
    let mut tiles = Vec::new();
    for gy in 0..side {
        let width = side - (gy * 31 + 17) % (side / 2);
        for gx in 0..width {
            tiles.push(Tile::new(gx as f64 * 128.0, gy as f64 * 128.0, 0));
        }
    }
    tiles
}

fn bench_flood_fill(c: &mut Criterion) {
    let grid = TileGrid::build(0, blob(64)).unwrap();
    c.bench_function("flood_fill_64x64", |b| {
        b.iter(|| {
            let islands = IslandBuilder::new(black_box(&grid)).build_all().unwrap();
            black_box(islands.len())
        })
    });
}

fn bench_boundary_trace(c: &mut Criterion) {
    let grid = TileGrid::build(0, blob(64)).unwrap();
    let islands = IslandBuilder::new(&grid).build_all().unwrap();
    c.bench_function("find_edges_64x64", |b| {
        b.iter_batched(
            || islands.clone(),
            |mut islands| {
                for island in &mut islands {
                    island.find_edges().unwrap();
                }
                black_box(islands[0].corners().len())
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_containment(c: &mut Criterion) {
    let grid = TileGrid::build(0, blob(64)).unwrap();
    let mut islands = IslandBuilder::new(&grid).build_all().unwrap();
    islands.sort_by_key(|i| std::cmp::Reverse(i.tile_count()));
    let mut island = islands.swap_remove(0);
    island.find_edges().unwrap();
    let shape = island.shape().unwrap();

    c.bench_function("shape_contains", |b| {
        b.iter(|| {
            let mut inside = 0u32;
            for i in 0..1000u32 {
                let p = Coords::new(f64::from(i * 13 % 8192), f64::from(i * 29 % 8192));
                if shape.contains(black_box(p)) {
                    inside += 1;
                }
            }
            black_box(inside)
        })
    });

    c.bench_function("grid_lookup", |b| {
        b.iter(|| {
            let mut found = 0u32;
            for i in 0..1000u32 {
                let p = Coords::new(
                    f64::from(i * 7 % 64) * 128.0,
                    f64::from(i * 11 % 64) * 128.0,
                );
                if grid.exists(black_box(p)) {
                    found += 1;
                }
            }
            black_box(found)
        })
    });
}

criterion_group!(
    benches,
    bench_flood_fill,
    bench_boundary_trace,
    bench_containment
);
criterion_main!(benches);
