//! Border extension rules used by the x/y and z filters.
//!
//! Semantics follow the OpenCV border modes existing parameter files refer
//! to, illustrated for a row `abcd`:
//!
//! ```text
//! Constant    000|abcd|000
//! Replicate   aaa|abcd|ddd
//! Reflect     cba|abcd|dcb
//! Reflect101  dcb|abcd|cba
//! Wrap        bcd|abcd|abc
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{NormalizeError, Result};

/// How samples outside the image (or outside the stack, along z) are formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderMode {
    /// Zero fill.
    Constant,
    /// Repeat the edge sample.
    Replicate,
    /// Mirror including the edge sample.
    Reflect,
    /// Mirror excluding the edge sample.
    #[default]
    Reflect101,
    /// Periodic continuation.
    Wrap,
}

impl BorderMode {
    /// Map an OpenCV `BORDER_*` integer code.
    pub fn from_opencv_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Constant),
            1 => Ok(Self::Replicate),
            2 => Ok(Self::Reflect),
            3 => Ok(Self::Wrap),
            4 => Ok(Self::Reflect101),
            other => Err(NormalizeError::UnknownBorderCode(other)),
        }
    }

    /// OpenCV `BORDER_*` integer code for this mode.
    pub fn opencv_code(self) -> i32 {
        match self {
            Self::Constant => 0,
            Self::Replicate => 1,
            Self::Reflect => 2,
            Self::Wrap => 3,
            Self::Reflect101 => 4,
        }
    }

    /// Resolve a possibly out-of-range index into `0..len`.
    ///
    /// Returns `None` when the sample lies outside and the mode is
    /// [`BorderMode::Constant`]; the caller then contributes zero.
    #[inline]
    pub fn resolve(self, i: isize, len: usize) -> Option<usize> {
        let n = len as isize;
        if (0..n).contains(&i) {
            return Some(i as usize);
        }
        if n == 1 {
            return match self {
                Self::Constant => None,
                _ => Some(0),
            };
        }
        let idx = match self {
            Self::Constant => return None,
            Self::Replicate => i.clamp(0, n - 1),
            Self::Wrap => i.rem_euclid(n),
            Self::Reflect => {
                let period = 2 * n;
                let m = i.rem_euclid(period);
                if m < n {
                    m
                } else {
                    period - 1 - m
                }
            }
            Self::Reflect101 => {
                let period = 2 * (n - 1);
                let m = i.rem_euclid(period);
                if m < n {
                    m
                } else {
                    period - m
                }
            }
        };
        Some(idx as usize)
    }
}

impl std::fmt::Display for BorderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Constant => "constant",
            Self::Replicate => "replicate",
            Self::Reflect => "reflect",
            Self::Reflect101 => "reflect101",
            Self::Wrap => "wrap",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extend(mode: BorderMode) -> Vec<Option<usize>> {
        (-3..7).map(|i| mode.resolve(i, 4)).collect()
    }

    #[test]
    fn modes_match_opencv_layouts() {
        // row abcd, indices -3..7
        assert_eq!(
            extend(BorderMode::Replicate),
            [0, 0, 0, 0, 1, 2, 3, 3, 3, 3].map(Some)
        );
        assert_eq!(
            extend(BorderMode::Reflect),
            [2, 1, 0, 0, 1, 2, 3, 3, 2, 1].map(Some)
        );
        assert_eq!(
            extend(BorderMode::Reflect101),
            [3, 2, 1, 0, 1, 2, 3, 2, 1, 0].map(Some)
        );
        assert_eq!(
            extend(BorderMode::Wrap),
            [1, 2, 3, 0, 1, 2, 3, 0, 1, 2].map(Some)
        );
        let constant = extend(BorderMode::Constant);
        assert_eq!(&constant[3..7], &[Some(0), Some(1), Some(2), Some(3)]);
        assert!(constant[..3].iter().chain(&constant[7..]).all(Option::is_none));
    }

    #[test]
    fn far_indices_stay_in_range() {
        for mode in [
            BorderMode::Replicate,
            BorderMode::Reflect,
            BorderMode::Reflect101,
            BorderMode::Wrap,
        ] {
            for len in 1..5 {
                for i in -20..20 {
                    let r = mode.resolve(i, len).expect("non-constant mode");
                    assert!(r < len, "{mode} i={i} len={len} -> {r}");
                }
            }
        }
    }

    #[test]
    fn opencv_codes_round_trip_and_reject_unknown() {
        for code in 0..5 {
            let mode = BorderMode::from_opencv_code(code).unwrap();
            assert_eq!(mode.opencv_code(), code);
        }
        assert_eq!(
            BorderMode::from_opencv_code(16),
            Err(NormalizeError::UnknownBorderCode(16))
        );
    }
}
