use criterion::{black_box, criterion_group, criterion_main, Criterion};
use localnorm::filter::{filter_z, gaussian_blur};
use localnorm::{
    normalize_plane, normalize_stack, BorderMode, Calibration, GaussianKernel1D,
    NormalizationSpec, NormalizeOptions, Plane, SmoothingScale,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Textured plane with slow illumination drift and sensor noise.
fn make_plane_fixture(width: u32, height: u32, seed: u64) -> Plane {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut p = Plane::new(width, height);
    for (x, y, px) in p.enumerate_pixels_mut() {
        let v = 800.0
            + 300.0 * ((x as f32 * 0.004).sin() + (y as f32 * 0.006).cos())
            + 60.0 * ((x as f32 * 0.09 + y as f32 * 0.07).sin())
            + rng.gen_range(-20.0f32..20.0f32);
        px[0] = v;
    }
    p
}

fn make_stack_fixture(width: u32, height: u32, depth: usize, seed: u64) -> Vec<Plane> {
    (0..depth)
        .map(|i| make_plane_fixture(width, height, seed + i as u64))
        .collect()
}

fn bench_blur(c: &mut Criterion) {
    let img = make_plane_fixture(1024, 1024, 3);

    c.bench_function("gaussian_blur_1024_s4", |b| {
        b.iter(|| {
            let out = gaussian_blur(black_box(&img), 4.0, 4.0, BorderMode::Reflect101);
            black_box(out.as_raw().len())
        })
    });

    c.bench_function("gaussian_blur_1024_s16", |b| {
        b.iter(|| {
            let out = gaussian_blur(black_box(&img), 16.0, 16.0, BorderMode::Reflect101);
            black_box(out.as_raw().len())
        })
    });
}

fn bench_filter_z(c: &mut Criterion) {
    let stack = make_stack_fixture(512, 512, 16, 11);
    let kz = GaussianKernel1D::new(2.0);

    c.bench_function("filter_z_512x512x16_s2", |b| {
        b.iter(|| black_box(filter_z(black_box(&stack), &kz, BorderMode::Reflect101).len()))
    });
}

fn bench_normalize_plane(c: &mut Criterion) {
    let img = make_plane_fixture(1024, 1024, 5);
    let opts = NormalizeOptions::default();

    c.bench_function("normalize_plane_1024_mean_only", |b| {
        b.iter(|| black_box(normalize_plane(black_box(&img), 8.0, 0.0, &opts)))
    });

    c.bench_function("normalize_plane_1024_mean_variance", |b| {
        b.iter(|| black_box(normalize_plane(black_box(&img), 8.0, 16.0, &opts)))
    });
}

fn bench_normalize_stack(c: &mut Criterion) {
    let stack = make_stack_fixture(512, 512, 16, 21);
    let cal = Calibration::new(0.325, 1.0);
    let spec = NormalizationSpec::with_variance_ratio(SmoothingScale::get_3d_isotropic(6.0), 2.0);
    let parallel = NormalizeOptions::default();
    let sequential = NormalizeOptions {
        parallel: false,
        ..NormalizeOptions::default()
    };

    c.bench_function("normalize_stack_512x512x16_parallel", |b| {
        b.iter(|| black_box(normalize_stack(black_box(&stack), &spec, &cal, &parallel)))
    });

    c.bench_function("normalize_stack_512x512x16_sequential", |b| {
        b.iter(|| black_box(normalize_stack(black_box(&stack), &spec, &cal, &sequential)))
    });
}

criterion_group!(
    hotpaths,
    bench_blur,
    bench_filter_z,
    bench_normalize_plane,
    bench_normalize_stack
);
criterion_main!(hotpaths);
