/// Largest kernel radius [`GaussianKernel1D::new`] builds.
///
/// Reached at `sigma ≈ 21845`. Larger sigmas are truncated to this radius;
/// the normalizer rejects them instead.
pub const MAX_KERNEL_RADIUS: usize = 1 << 16;

/// Sampled 1D Gaussian kernel (derivative order 0).
///
/// Conventions:
/// - `radius = ceil(3*sigma)`, minimum 1, at most [`MAX_KERNEL_RADIUS`].
/// - weights are normalized so that `sum(weights) == 1` up to rounding.
/// - `sigma <= 0` yields the identity kernel `[1.0]` (radius 0), so that
///   axis passes through unfiltered.
///
/// The radius and normalization are this crate's own choice. Kernels sampled
/// with a different truncation rule give slightly different numbers, so
/// outputs match other implementations only to within that truncation.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel1D {
    pub sigma: f64,
    pub radius: usize,
    pub weights: Vec<f64>,
}

impl GaussianKernel1D {
    /// Radius for `sigma`, or `None` when it would exceed
    /// [`MAX_KERNEL_RADIUS`] (including infinite sigma).
    pub fn radius_for(sigma: f64) -> Option<usize> {
        if sigma.is_nan() || sigma <= 0.0 {
            return Some(0);
        }
        let r = (3.0 * sigma).ceil();
        if r > MAX_KERNEL_RADIUS as f64 {
            return None;
        }
        Some((r as usize).max(1))
    }

    pub fn new(sigma: f64) -> Self {
        if sigma.is_nan() || sigma <= 0.0 {
            return Self::identity();
        }

        let radius = Self::radius_for(sigma).unwrap_or(MAX_KERNEL_RADIUS);
        let len = 2 * radius + 1;
        let denom = 2.0 * sigma * sigma;

        let mut weights = vec![0.0f64; len];
        for (i, w) in weights.iter_mut().enumerate() {
            let x = i as f64 - radius as f64;
            *w = (-(x * x) / denom).exp();
        }
        let sum: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Self {
            sigma,
            radius,
            weights,
        }
    }

    pub fn identity() -> Self {
        Self {
            sigma: 0.0,
            radius: 0,
            weights: vec![1.0],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.radius == 0
    }
}
