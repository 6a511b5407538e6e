//! localnorm: local Gaussian intensity normalization for microscopy planes
//! and z-stacks.
//!
//! Each pixel is replaced by its deviation from a Gaussian-weighted local
//! mean, optionally divided by a Gaussian-weighted local standard deviation.
//! Smoothing can extend along z, either in plane-index units or rescaled by
//! the voxel calibration so the kernel is isotropic in physical space.
//!
//! # Public API
//! - [`SmoothingScale`] and [`NormalizationSpec`] describe what to smooth
//! - [`Calibration`] supplies pixel size and z spacing
//! - [`GaussianNormalizer`] and the `normalize_*` functions run the pipeline
//! - [`NormalizeConfig`] bundles everything for JSON-driven use
//!
//! Planes are [`image::ImageBuffer`]s of `Luma<f32>`; see [`Plane`].

mod border;
mod calibration;
mod error;
pub mod filter;
mod kernel;
mod normalize;
pub mod plane;
mod scale;
mod spec;

#[cfg(test)]
mod test_utils;

pub use border::BorderMode;
pub use calibration::Calibration;
pub use error::{Axis, NormalizeError, Result};
pub use kernel::{GaussianKernel1D, MAX_KERNEL_RADIUS};
pub use normalize::{
    normalize_plane, normalize_plane_in_place, normalize_stack, normalize_stack_in_place,
    normalize_stack_with_sigmas, GaussianNormalizer, NormalizeConfig, NormalizeOptions,
};
pub use plane::{plane_stats, Plane, PlaneStats};
pub use scale::{ScaleKind, SmoothingScale};
pub use spec::{AxisSigmas, NormalizationSpec, NormalizationType};
