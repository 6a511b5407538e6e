//! Float image planes and the per-pixel arithmetic the pipeline needs.
//!
//! A plane is an `ImageBuffer<Luma<f32>>`; a z-stack is a slice of planes
//! with identical dimensions, ordered along z.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};

use crate::error::{NormalizeError, Result};

/// Single-channel 32-bit float plane.
pub type Plane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Convert an 8-bit grayscale image, keeping raw intensity values.
pub fn from_gray8(img: &GrayImage) -> Plane {
    let (w, h) = img.dimensions();
    let data = img.as_raw().iter().map(|&v| v as f32).collect();
    Plane::from_raw(w, h, data).expect("source dimensions match")
}

/// Convert a 16-bit grayscale image, keeping raw intensity values.
pub fn from_gray16(img: &ImageBuffer<Luma<u16>, Vec<u16>>) -> Plane {
    let (w, h) = img.dimensions();
    let data = img.as_raw().iter().map(|&v| v as f32).collect();
    Plane::from_raw(w, h, data).expect("source dimensions match")
}

/// Convert any decoded image to a float plane.
///
/// Integer grayscale data keeps its raw values; colour data is reduced to
/// luma at its native bit depth first. Float images keep their float luma.
pub fn from_dynamic(img: &DynamicImage) -> Plane {
    match img {
        DynamicImage::ImageLuma8(g) => from_gray8(g),
        DynamicImage::ImageLuma16(g) => from_gray16(g),
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => img.to_luma32f(),
        DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => from_gray16(&img.to_luma16()),
        _ => from_gray8(&img.to_luma8()),
    }
}

/// Map `[-range, range]` linearly onto `[0, 255]` for viewing.
///
/// Values outside the range saturate; non-finite values map to 0.
pub fn to_preview(plane: &Plane, range: f32) -> GrayImage {
    let (w, h) = plane.dimensions();
    let scale = if range > 0.0 { 127.5 / range } else { 0.0 };
    let data = plane
        .as_raw()
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return 0u8;
            }
            ((v + range) * scale).round().clamp(0.0, 255.0) as u8
        })
        .collect();
    GrayImage::from_raw(w, h, data).expect("plane dimensions match")
}

/// Check that a stack is non-empty and that every plane matches plane 0.
pub fn validate_stack(stack: &[Plane]) -> Result<[u32; 2]> {
    let first = stack.first().ok_or(NormalizeError::EmptyStack)?;
    let (w, h) = first.dimensions();
    let expected = [w, h];
    for (index, plane) in stack.iter().enumerate() {
        let (pw, ph) = plane.dimensions();
        if pw == 0 || ph == 0 {
            return Err(NormalizeError::EmptyPlane { index });
        }
        if [pw, ph] != expected {
            return Err(NormalizeError::DimensionMismatch {
                index,
                expected,
                got: [pw, ph],
            });
        }
    }
    Ok(expected)
}

/// Summary statistics of a plane.
///
/// `mean`, `std_dev`, `min` and `max` are computed over finite pixels only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneStats {
    pub width: u32,
    pub height: u32,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f32,
    pub max: f32,
    /// Number of NaN or infinite pixels.
    pub non_finite: usize,
}

pub fn plane_stats(plane: &Plane) -> PlaneStats {
    let (width, height) = plane.dimensions();
    let mut n = 0usize;
    let mut non_finite = 0usize;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in plane.as_raw() {
        if !v.is_finite() {
            non_finite += 1;
            continue;
        }
        n += 1;
        let vd = v as f64;
        sum += vd;
        sum_sq += vd * vd;
        min = min.min(v);
        max = max.max(v);
    }
    let (mean, std_dev) = if n > 0 {
        let mean = sum / n as f64;
        let var = (sum_sq / n as f64 - mean * mean).max(0.0);
        (mean, var.sqrt())
    } else {
        (f64::NAN, f64::NAN)
    };
    if n == 0 {
        min = f32::NAN;
        max = f32::NAN;
    }
    PlaneStats {
        width,
        height,
        mean,
        std_dev,
        min,
        max,
        non_finite,
    }
}

// ── element-wise arithmetic ────────────────────────────────────────────

/// `a * a` into a new plane.
pub(crate) fn squared(a: &Plane) -> Plane {
    let (w, h) = a.dimensions();
    let data = a.as_raw().iter().map(|&v| v * v).collect();
    Plane::from_raw(w, h, data).expect("plane dimensions match")
}

/// `a *= a`.
pub(crate) fn square_in_place(a: &mut Plane) {
    for v in a.iter_mut() {
        *v *= *v;
    }
}

/// `a -= b`.
pub(crate) fn sub_assign(a: &mut Plane, b: &Plane) {
    for (x, &y) in a.iter_mut().zip(b.as_raw()) {
        *x -= y;
    }
}

/// `b = a - b`, reusing `b`'s storage.
pub(crate) fn rsub_assign(b: &mut Plane, a: &Plane) {
    for (y, &x) in b.iter_mut().zip(a.as_raw()) {
        *y = x - *y;
    }
}

/// `a = sqrt(a)`; negative inputs give NaN.
pub(crate) fn sqrt_in_place(a: &mut Plane) {
    for v in a.iter_mut() {
        *v = v.sqrt();
    }
}

/// `a = max(a, floor)`. NaN stays NaN.
pub(crate) fn floor_in_place(a: &mut Plane, floor: f32) {
    for v in a.iter_mut() {
        if *v < floor {
            *v = floor;
        }
    }
}

/// `a /= b`.
pub(crate) fn div_assign(a: &mut Plane, b: &Plane) {
    for (x, &y) in a.iter_mut().zip(b.as_raw()) {
        *x /= y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gray8_conversion_keeps_raw_values() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(2, 1, Luma([200]));
        let p = from_gray8(&img);
        assert_eq!(p.dimensions(), (3, 2));
        assert_eq!(p.get_pixel(2, 1)[0], 200.0);
        assert_eq!(p.get_pixel(0, 0)[0], 0.0);
    }

    #[test]
    fn dynamic_luma16_keeps_raw_values() {
        let mut img = ImageBuffer::<Luma<u16>, Vec<u16>>::new(2, 2);
        img.put_pixel(1, 0, Luma([40000]));
        let p = from_dynamic(&DynamicImage::ImageLuma16(img));
        assert_eq!(p.get_pixel(1, 0)[0], 40000.0);
    }

    #[test]
    fn validate_rejects_empty_and_mismatched() {
        assert_eq!(validate_stack(&[]), Err(NormalizeError::EmptyStack));

        let stack = vec![Plane::new(4, 3), Plane::new(4, 3), Plane::new(3, 4)];
        assert_eq!(
            validate_stack(&stack),
            Err(NormalizeError::DimensionMismatch {
                index: 2,
                expected: [4, 3],
                got: [3, 4],
            })
        );

        assert_eq!(
            validate_stack(&[Plane::new(0, 3)]),
            Err(NormalizeError::EmptyPlane { index: 0 })
        );
        assert_eq!(validate_stack(&stack[..2]), Ok([4, 3]));
    }

    #[test]
    fn stats_skip_non_finite() {
        let p = Plane::from_raw(2, 2, vec![1.0, 3.0, f32::NAN, f32::INFINITY]).unwrap();
        let s = plane_stats(&p);
        assert_eq!(s.non_finite, 2);
        assert_relative_eq!(s.mean, 2.0);
        assert_relative_eq!(s.std_dev, 1.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
    }

    #[test]
    fn preview_maps_range_to_bytes() {
        let p = Plane::from_raw(4, 1, vec![-3.0, 0.0, 3.0, f32::NAN]).unwrap();
        let g = to_preview(&p, 3.0);
        assert_eq!(g.as_raw(), &vec![0u8, 128, 255, 0]);
    }

    #[test]
    fn arithmetic_helpers() {
        let a = Plane::from_raw(2, 1, vec![3.0, -2.0]).unwrap();
        let mut b = Plane::from_raw(2, 1, vec![1.0, 1.0]).unwrap();
        rsub_assign(&mut b, &squared(&a));
        assert_eq!(b.as_raw(), &vec![8.0, 3.0]);

        let mut c = a.clone();
        square_in_place(&mut c);
        sqrt_in_place(&mut c);
        assert_eq!(c.as_raw(), &vec![3.0, 2.0]);

        floor_in_place(&mut c, 2.5);
        assert_eq!(c.as_raw(), &vec![3.0, 2.5]);

        let mut d = a.clone();
        sub_assign(&mut d, &a);
        div_assign(&mut d, &c);
        assert_eq!(d.as_raw(), &vec![0.0, 0.0]);
    }
}
