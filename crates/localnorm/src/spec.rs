//! Parameter bundle pairing a mean-subtraction scale with an optional
//! variance-estimation scale.

use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;
use crate::scale::SmoothingScale;

/// Which local normalization to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationType {
    /// Leave the image untouched.
    None,
    /// Subtract the local Gaussian mean.
    GaussianMeanOnly,
    /// Subtract the local mean, then divide by the local standard deviation.
    #[default]
    GaussianMeanVariance,
}

/// Smoothing scales used by local normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizationSpec {
    /// Scale of the local mean estimate.
    pub scale: SmoothingScale,
    /// Scale of the local variance estimate; `None` subtracts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance_scale: Option<SmoothingScale>,
}

impl NormalizationSpec {
    pub fn new(scale: SmoothingScale, variance_scale: Option<SmoothingScale>) -> Self {
        Self {
            scale,
            variance_scale,
        }
    }

    /// Mean subtraction without variance normalization.
    pub fn subtract_only(scale: SmoothingScale) -> Self {
        Self::new(scale, None)
    }

    /// Derive the variance scale as `scale.sigma() * ratio`, same kind.
    ///
    /// `ratio <= 0` (or NaN) yields a subtraction-only spec.
    pub fn with_variance_ratio(scale: SmoothingScale, ratio: f64) -> Self {
        if ratio.is_nan() || ratio <= 0.0 {
            return Self::subtract_only(scale);
        }
        Self::new(scale, Some(scale.with_sigma(scale.sigma() * ratio)))
    }

    /// Build a spec for `kind`; `None` when no normalization is requested.
    ///
    /// `variance_ratio` only applies to [`NormalizationType::GaussianMeanVariance`].
    pub fn from_type(
        kind: NormalizationType,
        scale: SmoothingScale,
        variance_ratio: f64,
    ) -> Option<Self> {
        match kind {
            NormalizationType::None => None,
            NormalizationType::GaussianMeanOnly => Some(Self::subtract_only(scale)),
            NormalizationType::GaussianMeanVariance => {
                Some(Self::with_variance_ratio(scale, variance_ratio))
            }
        }
    }

    /// Normalization this spec actually performs.
    pub fn normalization_type(&self) -> NormalizationType {
        match self.variance_scale {
            Some(v) if v.sigma() > 0.0 => NormalizationType::GaussianMeanVariance,
            _ => NormalizationType::GaussianMeanOnly,
        }
    }

    /// Per-axis sigmas for both passes under `cal`.
    pub fn resolve(&self, cal: &Calibration) -> (AxisSigmas, AxisSigmas) {
        let mean = AxisSigmas::from_scale(&self.scale, cal);
        let variance = self
            .variance_scale
            .map(|v| AxisSigmas::from_scale(&v, cal))
            .unwrap_or_default();
        (mean, variance)
    }
}

/// Fully resolved sigmas: x and y in pixels, z in plane-index units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSigmas {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AxisSigmas {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same sigma along x and y, no z smoothing.
    pub fn planar(sigma: f64) -> Self {
        Self::new(sigma, sigma, 0.0)
    }

    pub fn from_scale(scale: &SmoothingScale, cal: &Calibration) -> Self {
        Self::new(scale.sigma(), scale.sigma(), scale.effective_z_sigma(cal))
    }

    /// `true` when any axis smooths.
    pub fn any_positive(&self) -> bool {
        self.x > 0.0 || self.y > 0.0 || self.z > 0.0
    }
}
