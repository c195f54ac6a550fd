//! Errors for building the character type distribution and for sampling,
//! scoring, and differentiating character types.
//!
//! [`TypeError`] wraps [`LibError`] for failures that originate in library
//! accessors and adds the structural problems specific to character types:
//! stroke counts outside the prior's support, primitives out of range,
//! control-point layouts that disagree with the library, and priors that
//! cannot be turned into proper distributions.
use crate::library::errors::LibError;

/// Result alias for type-distribution paths.
pub type TypeResult<T> = Result<T, TypeError>;

/// Unified error type for the character type distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeError {
    // ---- Library ----
    /// Error surfaced from a library accessor.
    Library(LibError),

    // ---- Prior construction ----
    /// A shape covariance is not symmetric positive definite.
    NotPositiveDefinite { primitive: usize },

    /// Gamma shape/scale for an inverse-scale prior are not positive.
    InvalidGammaParams { primitive: usize, shape: f64, scale: f64 },

    /// A categorical prior has no mass to sample from.
    DegenerateCategorical { field: &'static str },

    // ---- Character structure ----
    /// Stroke count outside `1..=max`.
    InvalidStrokeCount { k: usize, max: usize },

    /// Sub-stroke count outside `1..=max`.
    InvalidSubstrokeCount { nsub: usize, max: usize },

    /// Primitive id outside `[0, N)`.
    InvalidPrimitive { id: usize, n: usize },

    /// Character layout disagrees with the library or with itself.
    StructureMismatch { reason: &'static str },

    /// Flat parameter vector has the wrong length for the character.
    ThetaLengthMismatch { expected: usize, found: usize },
}

impl std::error::Error for TypeError {}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Library ----
            TypeError::Library(err) => write!(f, "Library error: {err}"),

            // ---- Prior construction ----
            TypeError::NotPositiveDefinite { primitive } => {
                write!(f, "Shape covariance of primitive {primitive} is not positive definite")
            }
            TypeError::InvalidGammaParams { primitive, shape, scale } => {
                write!(
                    f,
                    "Invalid gamma prior for primitive {primitive}: shape {shape}, scale {scale}"
                )
            }
            TypeError::DegenerateCategorical { field } => {
                write!(f, "Categorical prior '{field}' has no positive mass")
            }

            // ---- Character structure ----
            TypeError::InvalidStrokeCount { k, max } => {
                write!(f, "Invalid stroke count {k}: must be in [1, {max}]")
            }
            TypeError::InvalidSubstrokeCount { nsub, max } => {
                write!(f, "Invalid sub-stroke count {nsub}: must be in [1, {max}]")
            }
            TypeError::InvalidPrimitive { id, n } => {
                write!(f, "Invalid primitive id {id}: must be in [0, {n})")
            }
            TypeError::StructureMismatch { reason } => {
                write!(f, "Character structure mismatch: {reason}")
            }
            TypeError::ThetaLengthMismatch { expected, found } => {
                write!(f, "Theta length mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl From<LibError> for TypeError {
    fn from(err: LibError) -> Self {
        TypeError::Library(err)
    }
}
