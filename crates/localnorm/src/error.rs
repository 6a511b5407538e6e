//! Errors returned by the normalization entry points.
//!
//! Every variant is a precondition failure detected before the stack is
//! touched, so an `Err` always means the caller's buffers are unchanged.

/// Filter axis a sigma applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
        }
    }
}

/// Errors returned by local normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// The stack holds no planes.
    EmptyStack,
    /// A plane has zero width or height.
    EmptyPlane {
        /// Index of the offending plane in the stack.
        index: usize,
    },
    /// A plane's dimensions differ from the first plane's.
    DimensionMismatch {
        /// Index of the offending plane in the stack.
        index: usize,
        /// Dimensions `[width, height]` of plane 0.
        expected: [u32; 2],
        /// Dimensions `[width, height]` of the offending plane.
        got: [u32; 2],
    },
    /// A smoothing sigma is negative or non-finite.
    InvalidSigma {
        /// Axis the sigma was given for.
        axis: Axis,
        /// `true` for the variance-estimation pass.
        variance: bool,
        /// Value supplied.
        value: f64,
    },
    /// A sigma whose kernel radius would exceed
    /// [`MAX_KERNEL_RADIUS`](crate::MAX_KERNEL_RADIUS).
    SigmaTooLarge {
        axis: Axis,
        variance: bool,
        value: f64,
    },
    /// The optional standard-deviation floor is negative or non-finite.
    InvalidVarianceFloor(f32),
    /// An OpenCV border code with no `BorderMode` counterpart.
    UnknownBorderCode(i32),
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyStack => write!(f, "image stack is empty"),
            Self::EmptyPlane { index } => write!(f, "plane {index} has zero width or height"),
            Self::DimensionMismatch {
                index,
                expected,
                got,
            } => write!(
                f,
                "plane {index} is {}x{}, expected {}x{} like plane 0",
                got[0], got[1], expected[0], expected[1]
            ),
            Self::InvalidSigma {
                axis,
                variance,
                value,
            } => {
                let pass = if *variance { "variance" } else { "mean" };
                write!(
                    f,
                    "invalid {pass} sigma along {axis}: {value} (must be finite and >= 0)"
                )
            }
            Self::SigmaTooLarge {
                axis,
                variance,
                value,
            } => {
                let pass = if *variance { "variance" } else { "mean" };
                write!(
                    f,
                    "{pass} sigma along {axis} is too large: {value} (kernel radius limit {})",
                    crate::kernel::MAX_KERNEL_RADIUS
                )
            }
            Self::InvalidVarianceFloor(v) => {
                write!(f, "invalid variance floor: {v} (must be finite and >= 0)")
            }
            Self::UnknownBorderCode(code) => write!(f, "unknown border code: {code}"),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Shorthand result type for this crate.
pub type Result<T> = std::result::Result<T, NormalizeError>;
