use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meshpick_math::{Point2, Point3, Transform, Vec3, Viewport};
use meshpick_mesh::primitives;
use meshpick_raytrace::{check_intersection, check_intersection_with_mode, Bvh, PickMode, Ray};

fn dense_sphere() -> Arc<meshpick_mesh::Mesh> {
    // ~46k triangles
    Arc::new(primitives::uv_sphere(1.0, 192, 121).unwrap())
}

fn build_benchmark(c: &mut Criterion) {
    let mesh = dense_sphere();
    c.bench_function("bvh_build_sphere", |b| {
        b.iter(|| black_box(Bvh::build(black_box(mesh.clone()))))
    });
}

fn pick_benchmark(c: &mut Criterion) {
    let bvh = Bvh::build(dense_sphere());
    let viewport = Viewport::new(1200.0, 900.0);
    let view = Transform::look_at(&Point3::new(0.0, 0.0, 4.0), &Point3::origin(), &Vec3::y());
    let proj = Transform::perspective(45.0, viewport.aspect(), 0.01, 1000.0);
    let center = Point2::new(600.0, 450.0);
    let corner = Point2::new(5.0, 5.0);

    let mut group = c.benchmark_group("pick");
    group.bench_function("first_hit_center", |b| {
        b.iter(|| black_box(check_intersection(black_box(&center), &viewport, &bvh, &view, &proj)))
    });
    group.bench_function("nearest_center", |b| {
        b.iter(|| {
            black_box(check_intersection_with_mode(
                black_box(&center),
                &viewport,
                &bvh,
                &view,
                &proj,
                PickMode::Nearest,
            ))
        })
    });
    group.bench_function("miss_corner", |b| {
        b.iter(|| black_box(check_intersection(black_box(&corner), &viewport, &bvh, &view, &proj)))
    });
    group.finish();
}

fn brute_force_benchmark(c: &mut Criterion) {
    let mesh = dense_sphere();
    let ray = Ray::new(Point3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 0.0, -1.0));
    c.bench_function("brute_force_center", |b| {
        b.iter(|| {
            black_box(
                mesh.triangles()
                    .iter()
                    .find(|tri| ray.intersect_mesh_triangle(&mesh, tri).is_some())
                    .map(|tri| tri.id),
            )
        })
    });
}

criterion_group!(benches, build_benchmark, pick_benchmark, brute_force_benchmark);
criterion_main!(benches);
