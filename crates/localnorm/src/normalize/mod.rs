//! Local Gaussian normalization of planes and z-stacks.
//!
//! The pipeline for a stack and sigmas `(mean, variance)`:
//!
//! 1. Build 1D Gaussian kernels per axis for both passes. The variance pass
//!    runs only when one of its sigmas is positive.
//! 2. With variance enabled, square every plane into a parallel stack.
//! 3. If `mean.z > 0`, z-filter the stack (and the squared stack with the
//!    variance z kernel); otherwise copy the planes unfiltered.
//! 4. Per plane: x/y-filter the z-smoothed copy to get the local mean and
//!    subtract it from the original. With variance enabled, square the local
//!    mean, x/y-filter the squared plane, take `sqrt(E[x²] - E[x]²)` and
//!    divide the mean-subtracted plane by it.
//!
//! Step 3 completes for the whole stack before step 4 starts; step 4 is
//! independent per plane and may run on the rayon pool.

mod config;

use rayon::prelude::*;

use crate::calibration::Calibration;
use crate::error::{Axis, NormalizeError, Result};
use crate::filter::{filter_z, sep_filter_2d_in_place};
use crate::kernel::GaussianKernel1D;
use crate::plane::{self, Plane};
use crate::spec::{AxisSigmas, NormalizationSpec};

pub use config::{NormalizeConfig, NormalizeOptions};

/// One kernel per axis.
#[derive(Debug, Clone)]
struct KernelSet {
    x: GaussianKernel1D,
    y: GaussianKernel1D,
    z: GaussianKernel1D,
}

impl KernelSet {
    fn new(sigmas: &AxisSigmas) -> Self {
        Self {
            x: GaussianKernel1D::new(sigmas.x),
            y: GaussianKernel1D::new(sigmas.y),
            z: GaussianKernel1D::new(sigmas.z),
        }
    }
}

fn check_sigmas(sigmas: &AxisSigmas, variance: bool) -> Result<()> {
    for (axis, value) in [(Axis::X, sigmas.x), (Axis::Y, sigmas.y), (Axis::Z, sigmas.z)] {
        if !value.is_finite() || value < 0.0 {
            return Err(NormalizeError::InvalidSigma {
                axis,
                variance,
                value,
            });
        }
        if GaussianKernel1D::radius_for(value).is_none() {
            return Err(NormalizeError::SigmaTooLarge {
                axis,
                variance,
                value,
            });
        }
    }
    Ok(())
}

/// Local mean/variance normalizer with fully resolved sigmas.
///
/// Construct once and apply to many stacks; kernels are rebuilt per call.
#[derive(Debug, Clone)]
pub struct GaussianNormalizer {
    mean: AxisSigmas,
    variance: AxisSigmas,
    options: NormalizeOptions,
}

impl GaussianNormalizer {
    /// Validate sigmas and options.
    ///
    /// Sigmas must be finite, non-negative and small enough that the kernel
    /// radius stays within [`MAX_KERNEL_RADIUS`](crate::MAX_KERNEL_RADIUS).
    /// An all-zero `variance` selects subtraction-only normalization.
    pub fn new(
        mean: AxisSigmas,
        variance: AxisSigmas,
        options: NormalizeOptions,
    ) -> Result<Self> {
        check_sigmas(&mean, false)?;
        check_sigmas(&variance, true)?;
        if let Some(floor) = options.variance_floor {
            if !floor.is_finite() || floor < 0.0 {
                return Err(NormalizeError::InvalidVarianceFloor(floor));
            }
        }
        Ok(Self {
            mean,
            variance,
            options,
        })
    }

    /// Resolve `spec` under `cal` and build a normalizer.
    pub fn from_spec(
        spec: &NormalizationSpec,
        cal: &Calibration,
        options: NormalizeOptions,
    ) -> Result<Self> {
        let (mean, variance) = spec.resolve(cal);
        Self::new(mean, variance, options)
    }

    pub fn mean_sigmas(&self) -> AxisSigmas {
        self.mean
    }

    pub fn variance_sigmas(&self) -> AxisSigmas {
        self.variance
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// `true` when the variance pass runs.
    pub fn does_variance(&self) -> bool {
        self.variance.any_positive()
    }

    /// Normalize `stack` in place.
    ///
    /// On error nothing has been modified.
    pub fn apply_in_place(&self, stack: &mut [Plane]) -> Result<()> {
        let [w, h] = plane::validate_stack(stack)?;
        let border = self.options.border;
        let mean_k = KernelSet::new(&self.mean);
        let var_k = self.does_variance().then(|| KernelSet::new(&self.variance));

        tracing::debug!(
            "normalizing {} plane(s) of {}x{}: mean sigma ({:.3}, {:.3}, {:.3}) radius ({}, {}, {}), variance {}",
            stack.len(),
            w,
            h,
            self.mean.x,
            self.mean.y,
            self.mean.z,
            mean_k.x.radius,
            mean_k.y.radius,
            mean_k.z.radius,
            match &var_k {
                Some(k) => format!(
                    "sigma ({:.3}, {:.3}, {:.3}) radius ({}, {}, {})",
                    self.variance.x,
                    self.variance.y,
                    self.variance.z,
                    k.x.radius,
                    k.y.radius,
                    k.z.radius
                ),
                None => "off".to_string(),
            }
        );

        let mut squared: Vec<Option<Plane>> = match var_k {
            Some(_) => stack.iter().map(|p| Some(plane::squared(p))).collect(),
            None => vec![None; stack.len()],
        };

        // z pass: must finish for all planes before the per-plane pass.
        let smoothed = if self.mean.z > 0.0 {
            if let Some(vk) = &var_k {
                let filtered = {
                    let sq: Vec<Plane> = squared.drain(..).flatten().collect();
                    filter_z(&sq, &vk.z, border)
                };
                squared = filtered.into_iter().map(Some).collect();
            }
            filter_z(stack, &mean_k.z, border)
        } else {
            stack.to_vec()
        };

        let step = |i: usize, original: &mut Plane, smooth: Plane, sq: Option<Plane>| {
            tracing::trace!("plane {i}: x/y pass");
            self.normalize_plane_xy(original, smooth, sq, &mean_k, var_k.as_ref());
        };
        if self.options.parallel && stack.len() > 1 {
            stack
                .par_iter_mut()
                .zip(smoothed.into_par_iter())
                .zip(squared.into_par_iter())
                .enumerate()
                .for_each(|(i, ((original, smooth), sq))| step(i, original, smooth, sq));
        } else {
            for (i, ((original, smooth), sq)) in stack
                .iter_mut()
                .zip(smoothed)
                .zip(squared)
                .enumerate()
            {
                step(i, original, smooth, sq);
            }
        }

        if var_k.is_some() {
            let non_finite: usize = stack
                .iter()
                .map(|p| p.as_raw().iter().filter(|v| !v.is_finite()).count())
                .sum();
            if non_finite > 0 {
                tracing::warn!(
                    "{} non-finite pixel(s) after variance normalization; consider a variance floor",
                    non_finite
                );
            }
        }
        Ok(())
    }

    /// Normalize a copy of `stack`, leaving the input untouched.
    pub fn apply(&self, stack: &[Plane]) -> Result<Vec<Plane>> {
        let mut out = stack.to_vec();
        self.apply_in_place(&mut out)?;
        Ok(out)
    }

    /// Per-plane x/y stage. `smooth` is this plane's z-smoothed copy and
    /// `squared` its z-smoothed square; both are consumed.
    fn normalize_plane_xy(
        &self,
        original: &mut Plane,
        mut smooth: Plane,
        squared: Option<Plane>,
        mean_k: &KernelSet,
        var_k: Option<&KernelSet>,
    ) {
        let border = self.options.border;
        sep_filter_2d_in_place(&mut smooth, &mean_k.x, &mean_k.y, border);
        plane::sub_assign(original, &smooth);

        let (Some(mut squared), Some(var_k)) = (squared, var_k) else {
            return;
        };
        plane::square_in_place(&mut smooth);
        sep_filter_2d_in_place(&mut squared, &var_k.x, &var_k.y, border);
        // smooth <- E[x²] - E[x]², then its square root
        plane::rsub_assign(&mut smooth, &squared);
        plane::sqrt_in_place(&mut smooth);
        if let Some(floor) = self.options.variance_floor {
            plane::floor_in_place(&mut smooth, floor);
        }
        plane::div_assign(original, &smooth);
    }
}

// ── entry points ───────────────────────────────────────────────────────

/// Normalize a stack in place with fully resolved sigmas.
///
/// `variance` all zero means subtraction only. z sigmas are in plane-index
/// units.
pub fn normalize_stack_with_sigmas(
    stack: &mut [Plane],
    mean: AxisSigmas,
    variance: AxisSigmas,
    options: &NormalizeOptions,
) -> Result<()> {
    GaussianNormalizer::new(mean, variance, options.clone())?.apply_in_place(stack)
}

/// Normalize a stack in place, resolving z sigmas from `cal`.
pub fn normalize_stack_in_place(
    stack: &mut [Plane],
    spec: &NormalizationSpec,
    cal: &Calibration,
    options: &NormalizeOptions,
) -> Result<()> {
    GaussianNormalizer::from_spec(spec, cal, options.clone())?.apply_in_place(stack)
}

/// Non-mutating form of [`normalize_stack_in_place`].
pub fn normalize_stack(
    stack: &[Plane],
    spec: &NormalizationSpec,
    cal: &Calibration,
    options: &NormalizeOptions,
) -> Result<Vec<Plane>> {
    GaussianNormalizer::from_spec(spec, cal, options.clone())?.apply(stack)
}

/// Normalize one 2D plane in place.
///
/// `variance_sigma <= 0` subtracts the local mean only.
pub fn normalize_plane_in_place(
    plane: &mut Plane,
    sigma: f64,
    variance_sigma: f64,
    options: &NormalizeOptions,
) -> Result<()> {
    let variance = if variance_sigma > 0.0 {
        AxisSigmas::planar(variance_sigma)
    } else {
        AxisSigmas::default()
    };
    normalize_stack_with_sigmas(
        std::slice::from_mut(plane),
        AxisSigmas::planar(sigma),
        variance,
        options,
    )
}

/// Non-mutating form of [`normalize_plane_in_place`].
pub fn normalize_plane(
    plane: &Plane,
    sigma: f64,
    variance_sigma: f64,
    options: &NormalizeOptions,
) -> Result<Plane> {
    let mut out = plane.clone();
    normalize_plane_in_place(&mut out, sigma, variance_sigma, options)?;
    Ok(out)
}

impl NormalizeConfig {
    /// Normalize `stack` in place with this configuration.
    pub fn apply_in_place(&self, stack: &mut [Plane]) -> Result<()> {
        normalize_stack_in_place(stack, &self.spec, &self.calibration, &self.options)
    }
}
