//! Separable x/y correlation of a plane and 1D filtering along the z axis.
//!
//! Both use the same [`BorderMode`] for samples beyond the data. Weights
//! and accumulators are `f64`; results are stored as `f32`.

use crate::border::BorderMode;
use crate::kernel::GaussianKernel1D;
use crate::plane::Plane;

/// Correlate every row of `src` with `kernel`.
fn filter_rows(
    src: &[f32],
    width: usize,
    height: usize,
    kernel: &[f64],
    border: BorderMode,
) -> Vec<f32> {
    let r = kernel.len() / 2;
    let mut out = vec![0.0f32; src.len()];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        let out_row = &mut out[y * width..(y + 1) * width];
        for (x, o) in out_row.iter_mut().enumerate() {
            let mut acc = 0.0f64;
            if x >= r && x + r < width {
                let window = &row[x - r..=x + r];
                for (&w, &v) in kernel.iter().zip(window) {
                    acc += w * v as f64;
                }
            } else {
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = x as isize + k as isize - r as isize;
                    if let Some(ix) = border.resolve(sx, width) {
                        acc += w * row[ix] as f64;
                    }
                }
            }
            *o = acc as f32;
        }
    }
    out
}

/// Correlate every column of `src` with `kernel`.
fn filter_cols(
    src: &[f32],
    width: usize,
    height: usize,
    kernel: &[f64],
    border: BorderMode,
) -> Vec<f32> {
    let r = kernel.len() / 2;
    let mut out = vec![0.0f32; src.len()];
    let mut acc = vec![0.0f64; width];
    for y in 0..height {
        acc.iter_mut().for_each(|a| *a = 0.0);
        for (k, &w) in kernel.iter().enumerate() {
            let sy = y as isize + k as isize - r as isize;
            let Some(iy) = border.resolve(sy, height) else {
                continue;
            };
            let row = &src[iy * width..(iy + 1) * width];
            for (a, &v) in acc.iter_mut().zip(row) {
                *a += w * v as f64;
            }
        }
        for (o, &a) in out[y * width..(y + 1) * width].iter_mut().zip(&acc) {
            *o = a as f32;
        }
    }
    out
}

/// Separable 2D filter: `kx` along rows, then `ky` along columns.
///
/// Identity kernels skip their pass.
pub fn sep_filter_2d(
    src: &Plane,
    kx: &GaussianKernel1D,
    ky: &GaussianKernel1D,
    border: BorderMode,
) -> Plane {
    let (w, h) = src.dimensions();
    let (width, height) = (w as usize, h as usize);
    let mut data = if kx.is_identity() {
        src.as_raw().clone()
    } else {
        filter_rows(src.as_raw(), width, height, &kx.weights, border)
    };
    if !ky.is_identity() {
        data = filter_cols(&data, width, height, &ky.weights, border);
    }
    Plane::from_raw(w, h, data).expect("filtered plane keeps source dimensions")
}

/// In-place form of [`sep_filter_2d`].
pub fn sep_filter_2d_in_place(
    plane: &mut Plane,
    kx: &GaussianKernel1D,
    ky: &GaussianKernel1D,
    border: BorderMode,
) {
    if kx.is_identity() && ky.is_identity() {
        return;
    }
    *plane = sep_filter_2d(plane, kx, ky, border);
}

/// Gaussian blur of a plane with per-axis sigmas.
pub fn gaussian_blur(src: &Plane, sigma_x: f64, sigma_y: f64, border: BorderMode) -> Plane {
    sep_filter_2d(
        src,
        &GaussianKernel1D::new(sigma_x),
        &GaussianKernel1D::new(sigma_y),
        border,
    )
}

/// Filter a z-stack along the plane index with `kz`, per pixel.
///
/// Produces a new stack of the same length and plane shape. An identity
/// kernel returns deep copies. All planes must share dimensions.
pub fn filter_z(stack: &[Plane], kz: &GaussianKernel1D, border: BorderMode) -> Vec<Plane> {
    if kz.is_identity() {
        return stack.to_vec();
    }
    let n = stack.len();
    let r = kz.radius;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let (w, h) = stack[i].dimensions();
        let mut acc = vec![0.0f64; (w as usize) * (h as usize)];
        for (k, &weight) in kz.weights.iter().enumerate() {
            let sz = i as isize + k as isize - r as isize;
            let Some(iz) = border.resolve(sz, n) else {
                continue;
            };
            for (a, &v) in acc.iter_mut().zip(stack[iz].as_raw()) {
                *a += weight * v as f64;
            }
        }
        let data = acc.into_iter().map(|a| a as f32).collect();
        out.push(Plane::from_raw(w, h, data).expect("z-filtered plane keeps source dimensions"));
    }
    out
}
