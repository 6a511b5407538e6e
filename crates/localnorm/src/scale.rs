//! Smoothing scales: a sigma plus how it extends into z.

use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;

/// How a smoothing scale treats the z axis of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleKind {
    /// Smooth each plane independently.
    #[serde(rename = "2d")]
    Scale2D,
    /// Smooth along z with the same sigma in plane-index units.
    #[serde(rename = "3d")]
    Scale3D,
    /// Smooth along z with sigma rescaled so the physical extent matches xy.
    #[serde(rename = "3d_isotropic")]
    Scale3DIsotropic,
}

/// One Gaussian smoothing operation.
///
/// Equality and hashing compare the sigma bit pattern, so `0.0` and `-0.0`
/// are different scales.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmoothingScale {
    sigma: f64,
    kind: ScaleKind,
}

impl SmoothingScale {
    pub fn new(kind: ScaleKind, sigma: f64) -> Self {
        Self { sigma, kind }
    }

    /// Plane-wise smoothing.
    pub fn get_2d(sigma: f64) -> Self {
        Self::new(ScaleKind::Scale2D, sigma)
    }

    /// 3D smoothing ignoring voxel anisotropy.
    pub fn get_3d_anisotropic(sigma: f64) -> Self {
        Self::new(ScaleKind::Scale3D, sigma)
    }

    /// 3D smoothing corrected for z spacing.
    pub fn get_3d_isotropic(sigma: f64) -> Self {
        Self::new(ScaleKind::Scale3DIsotropic, sigma)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    /// Same kind, different sigma.
    pub fn with_sigma(&self, sigma: f64) -> Self {
        Self::new(self.kind, sigma)
    }

    /// Sigma along z, in plane-index units.
    ///
    /// Isotropic scales convert `sigma` (in xy pixels) to z planes via
    /// `sigma * pixel_size / z_spacing`. A non-finite z spacing counts as 1.
    pub fn effective_z_sigma(&self, cal: &Calibration) -> f64 {
        match self.kind {
            ScaleKind::Scale2D => 0.0,
            ScaleKind::Scale3D => self.sigma,
            ScaleKind::Scale3DIsotropic => {
                let pixel_size = cal.averaged_pixel_size();
                let z_spacing = if cal.z_spacing.is_finite() {
                    cal.z_spacing
                } else {
                    1.0
                };
                self.sigma / z_spacing * pixel_size
            }
        }
    }
}

impl PartialEq for SmoothingScale {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.sigma.to_bits() == other.sigma.to_bits()
    }
}

impl Eq for SmoothingScale {}

impl std::hash::Hash for SmoothingScale {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.sigma.to_bits().hash(state);
    }
}

/// Up to two decimals, trailing zeros dropped: `2.50` -> `2.5`, `3.00` -> `3`.
fn format_sigma(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

impl std::fmt::Display for SmoothingScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "σ: {}", format_sigma(self.sigma))?;
        match self.kind {
            ScaleKind::Scale2D => Ok(()),
            ScaleKind::Scale3D => write!(f, " (3D)"),
            ScaleKind::Scale3DIsotropic => write!(f, " (3D isotropic)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    #[test]
    fn scale_2d_has_no_z_component() {
        let s = SmoothingScale::get_2d(4.0);
        for cal in [
            Calibration::default(),
            Calibration::new(0.25, 3.0),
            Calibration::without_z(0.5),
            Calibration::new(f64::NAN, f64::INFINITY),
        ] {
            assert_eq!(s.effective_z_sigma(&cal), 0.0);
        }
    }

    #[test]
    fn anisotropic_scale_passes_sigma_through() {
        let s = SmoothingScale::get_3d_anisotropic(2.5);
        assert_eq!(s.effective_z_sigma(&Calibration::new(0.1, 5.0)), 2.5);
    }

    #[test]
    fn isotropic_scale_corrects_for_z_spacing() {
        let s = SmoothingScale::get_3d_isotropic(4.0);
        // 4 px * 0.5 µm/px = 2 µm = 1 plane at 2 µm spacing
        assert_relative_eq!(s.effective_z_sigma(&Calibration::new(0.5, 2.0)), 1.0);

        let cal = Calibration {
            pixel_width: 0.2,
            pixel_height: 0.4,
            z_spacing: 0.6,
        };
        assert_relative_eq!(s.effective_z_sigma(&cal), 4.0 / 0.6 * 0.3, epsilon = 1e-12);
    }

    #[test]
    fn isotropic_scale_falls_back_to_unit_z_spacing() {
        let s = SmoothingScale::get_3d_isotropic(3.0);
        for z in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let cal = Calibration::new(0.65, z);
            assert_relative_eq!(s.effective_z_sigma(&cal), 3.0 * 0.65);
        }
    }

    #[test]
    fn equality_and_hash_are_structural() {
        let a = SmoothingScale::get_3d_isotropic(2.0);
        assert_eq!(a, SmoothingScale::get_3d_isotropic(2.0));
        assert_ne!(a, SmoothingScale::get_3d_anisotropic(2.0));
        assert_ne!(a, SmoothingScale::get_3d_isotropic(2.5));

        let set: HashSet<_> = [a, a.with_sigma(2.0), a.with_sigma(1.0)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_labels() {
        assert_eq!(SmoothingScale::get_2d(2.0).to_string(), "σ: 2");
        assert_eq!(SmoothingScale::get_3d_anisotropic(1.5).to_string(), "σ: 1.5 (3D)");
        assert_eq!(
            SmoothingScale::get_3d_isotropic(0.126).to_string(),
            "σ: 0.13 (3D isotropic)"
        );
    }

    #[test]
    fn serde_uses_short_kind_names() {
        let json = serde_json::to_string(&SmoothingScale::get_3d_isotropic(2.0)).unwrap();
        assert_eq!(json, r#"{"sigma":2.0,"kind":"3d_isotropic"}"#);

        let back: SmoothingScale = serde_json::from_str(r#"{"sigma":1.0,"kind":"2d"}"#).unwrap();
        assert_eq!(back, SmoothingScale::get_2d(1.0));
    }
}
