use serde::{Deserialize, Serialize};

/// Physical pixel calibration supplied by the caller.
///
/// Sizes share one unit (typically µm). `z_spacing` may be non-finite when
/// the source carries no z calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Pixel width.
    pub pixel_width: f64,
    /// Pixel height.
    pub pixel_height: f64,
    /// Distance between consecutive z planes.
    pub z_spacing: f64,
}

impl Default for Calibration {
    /// Uncalibrated pixels: every size is 1.0.
    fn default() -> Self {
        Self {
            pixel_width: 1.0,
            pixel_height: 1.0,
            z_spacing: 1.0,
        }
    }
}

impl Calibration {
    /// Square pixels of size `pixel_size` with the given z spacing.
    pub fn new(pixel_size: f64, z_spacing: f64) -> Self {
        Self {
            pixel_width: pixel_size,
            pixel_height: pixel_size,
            z_spacing,
        }
    }

    /// Square pixels with no z calibration.
    pub fn without_z(pixel_size: f64) -> Self {
        Self::new(pixel_size, f64::NAN)
    }

    /// Mean of pixel width and height.
    pub fn averaged_pixel_size(&self) -> f64 {
        0.5 * (self.pixel_width + self.pixel_height)
    }
}
