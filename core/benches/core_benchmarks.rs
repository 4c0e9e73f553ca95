use criterion::{Criterion, black_box, criterion_group, criterion_main};

use prism_core::camera::FlyCamera;
use prism_core::math::Vec3;
use prism_core::mesh::generators::{generate_cube, generate_screen_quad, generate_uv_sphere};
use prism_core::texture::EnvironmentMap;

// ---------------------------------------------------------------------------
// Mesh generation
// ---------------------------------------------------------------------------

fn bench_generate_sphere_low(c: &mut Criterion) {
    c.bench_function("generate_uv_sphere_16x16", |b| {
        b.iter(|| generate_uv_sphere(black_box(16), black_box(16)));
    });
}

fn bench_generate_sphere_default(c: &mut Criterion) {
    c.bench_function("generate_uv_sphere_64x64", |b| {
        b.iter(|| generate_uv_sphere(black_box(64), black_box(64)));
    });
}

fn bench_generate_cube(c: &mut Criterion) {
    c.bench_function("generate_cube", |b| {
        b.iter(generate_cube);
    });
}

fn bench_generate_screen_quad(c: &mut Criterion) {
    c.bench_function("generate_screen_quad", |b| {
        b.iter(generate_screen_quad);
    });
}

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

fn bench_camera_look(c: &mut Criterion) {
    c.bench_function("fly_camera_look_and_view", |b| {
        let mut camera = FlyCamera::default();
        b.iter(|| {
            camera.look(black_box(1.5), black_box(-0.5));
            black_box(camera.view_matrix())
        });
    });
}

// ---------------------------------------------------------------------------
// Environment sampling
// ---------------------------------------------------------------------------

fn bench_environment_sample(c: &mut Criterion) {
    let map = match EnvironmentMap::uniform(256, 128, [1.0, 0.5, 0.25]) {
        Ok(map) => map,
        Err(e) => panic!("{e}"),
    };
    let dir = Vec3::new(0.3, 0.4, -0.8);
    c.bench_function("environment_sample_direction", |b| {
        b.iter(|| map.sample_direction(black_box(&dir)));
    });
}

criterion_group!(
    meshes,
    bench_generate_sphere_low,
    bench_generate_sphere_default,
    bench_generate_cube,
    bench_generate_screen_quad,
);
criterion_group!(camera, bench_camera_look);
criterion_group!(environment, bench_environment_sample);
criterion_main!(meshes, camera, environment);
