//! Shared synthetic planes for unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::plane::Plane;

/// Plane with every pixel set to `value`.
pub(crate) fn constant_plane(w: u32, h: u32, value: f32) -> Plane {
    Plane::from_pixel(w, h, image::Luma([value]))
}

/// Deterministic uniform noise in `[0, 255)`.
pub(crate) fn random_plane(w: u32, h: u32, seed: u64) -> Plane {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..(w * h) as usize)
        .map(|_| rng.gen_range(0.0f32..255.0f32))
        .collect();
    Plane::from_raw(w, h, data).expect("dimensions match")
}

/// Textured plane on a slow illumination ramp.
///
/// Intensity is `offset + gain * (x + y) + noise`, the kind of drift local
/// normalization is meant to remove.
pub(crate) fn ramp_plane(w: u32, h: u32, offset: f32, gain: f32, seed: u64) -> Plane {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut p = Plane::new(w, h);
    for (x, y, px) in p.enumerate_pixels_mut() {
        let noise = rng.gen_range(-10.0f32..10.0f32);
        px[0] = offset + gain * (x + y) as f32 + noise;
    }
    p
}

/// `n` random planes of identical shape.
pub(crate) fn random_stack(w: u32, h: u32, n: usize, seed: u64) -> Vec<Plane> {
    (0..n)
        .map(|i| random_plane(w, h, seed.wrapping_add(i as u64)))
        .collect()
}
