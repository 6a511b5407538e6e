use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::border::BorderMode;
use crate::calibration::Calibration;
use crate::spec::NormalizationSpec;

/// Execution options shared by every normalization entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Border extension used by the x/y filters and the z filter.
    pub border: BorderMode,
    /// Optional lower bound applied to the local standard deviation before
    /// dividing.
    ///
    /// `None` divides by the raw estimate, so flat regions can produce very
    /// large or non-finite values. Set a small positive floor to bound them.
    pub variance_floor: Option<f32>,
    /// Run the per-plane pass on the rayon pool.
    ///
    /// Output is identical either way; planes are processed independently.
    pub parallel: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            border: BorderMode::default(),
            variance_floor: None,
            parallel: true,
        }
    }
}

/// Complete normalization setup, loadable from JSON.
///
/// ```json
/// {
///   "spec": {
///     "scale": { "sigma": 4.0, "kind": "3d_isotropic" },
///     "variance_scale": { "sigma": 8.0, "kind": "3d_isotropic" }
///   },
///   "calibration": { "pixel_width": 0.325, "pixel_height": 0.325, "z_spacing": 1.0 },
///   "options": { "border": "reflect101" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    pub spec: NormalizationSpec,
    #[serde(default)]
    pub calibration: Calibration,
    #[serde(default)]
    pub options: NormalizeOptions,
}

impl NormalizeConfig {
    pub fn new(spec: NormalizationSpec) -> Self {
        Self {
            spec,
            calibration: Calibration::default(),
            options: NormalizeOptions::default(),
        }
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::SmoothingScale;

    #[test]
    fn documented_json_parses() {
        let json = r#"{
            "spec": {
                "scale": { "sigma": 4.0, "kind": "3d_isotropic" },
                "variance_scale": { "sigma": 8.0, "kind": "3d_isotropic" }
            },
            "calibration": { "pixel_width": 0.325, "pixel_height": 0.325, "z_spacing": 1.0 },
            "options": { "border": "reflect101" }
        }"#;
        let cfg: NormalizeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.spec.scale, SmoothingScale::get_3d_isotropic(4.0));
        assert_eq!(cfg.calibration.pixel_width, 0.325);
        assert_eq!(cfg.options.border, BorderMode::Reflect101);
        assert!(cfg.options.parallel);
        assert_eq!(cfg.options.variance_floor, None);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{ "spec": { "scale": { "sigma": 2.0, "kind": "2d" } } }"#;
        let cfg: NormalizeConfig = serde_json::from_str(json).unwrap();
        let spec = NormalizationSpec::subtract_only(SmoothingScale::get_2d(2.0));
        assert_eq!(cfg, NormalizeConfig::new(spec));
    }
}
