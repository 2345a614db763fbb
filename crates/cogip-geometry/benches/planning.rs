use cogip_geometry::{Bounds, ObstaclePolygon, Vertex, VisibilityRoadMap};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn build_map() -> (VisibilityRoadMap, Vec<ObstaclePolygon>) {
    let fixed = vec![
        ObstaclePolygon::rectangle(Vertex::new(550.0, 1.0), 0.0, 450.0, 450.0, 60.0).unwrap(),
        ObstaclePolygon::rectangle(Vertex::new(775.0, 800.0), 0.0, 450.0, 450.0, 60.0).unwrap(),
    ];
    let dynamic = (0..6)
        .map(|i| {
            let center = Vertex::new(1200.0 + 250.0 * i as f64, -300.0 + 120.0 * i as f64);
            ObstaclePolygon::circle(center, 150.0, 8, 60.0).unwrap()
        })
        .collect();
    (
        VisibilityRoadMap::new(Bounds::new(150.0, 2850.0, -850.0, 850.0), fixed),
        dynamic,
    )
}

fn bench_planning(c: &mut Criterion) {
    let (map, dynamic) = build_map();
    let start = Vertex::new(225.0, -775.0);
    let goal = Vertex::new(2700.0, 600.0);

    c.bench_function("visibility_planning_8_obstacles", |b| {
        b.iter(|| map.planning(black_box(start), black_box(goal), black_box(&dynamic), 2500.0))
    });
}

criterion_group!(benches, bench_planning);
criterion_main!(benches);
