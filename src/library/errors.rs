//! Errors for loading, reshaping, and validating the parameter library.
//!
//! [`LibError`] covers every failure between an on-disk parameter source and a
//! fully validated [`Library`](crate::library::Library): absent files,
//! unreadable or malformed arrays, dimension and normalization invariants, and
//! out-of-range discrete indices passed to accessors.
//!
//! ## Conventions
//! - **Indices are 0-based**.
//! - Field names are reported as `group/field` (e.g. `shape/mu`) or as the bare
//!   single-file name (e.g. `logStart`).
//! - I/O and parse failures keep the offending path and a human-readable
//!   reason rather than the source error, so the enum stays `Clone + PartialEq`.

/// Result alias for library construction and accessor paths.
pub type LibResult<T> = Result<T, LibError>;

/// Unified error type for the parameter library and its spatial model.
#[derive(Debug, Clone, PartialEq)]
pub enum LibError {
    // ---- Parameter source ----
    /// A required group directory, field file, or single file is absent.
    MissingParameter { name: String },

    /// Reading a parameter file or listing a directory failed.
    Io { path: String, reason: String },

    /// A parameter file is not a well-formed numeric array record.
    Parse { path: String, reason: String },

    // ---- Shape invariants ----
    /// A field has the wrong number of axes after squeezing.
    RankMismatch { field: String, expected: usize, found: usize },

    /// A field's dimension disagrees with the library-wide dimension.
    ShapeMismatch { field: String, expected: usize, found: usize },

    /// `shape/mu` must have a non-zero even width (x and y per control point).
    OddControlWidth { width: usize },

    // ---- Normalization invariants ----
    /// A log-probability vector does not exponentiate to a distribution.
    NotNormalized { field: String, sum: f64 },

    // ---- Accessors ----
    /// Primitive state index outside `[0, N)`.
    InvalidState { state: usize, n: usize },

    /// Relation-category id outside the spatial model.
    InvalidRelation { rid: usize, len: usize },

    // ---- Spatial model ----
    /// A spatial model needs at least one histogram.
    EmptySpatialModel,

    /// Histogram metadata is inconsistent.
    InvalidHistogram { reason: &'static str },

    // ---- Capabilities ----
    /// Operation is declared but deliberately not supported.
    NotSupported { operation: &'static str },
}

impl std::error::Error for LibError {}

impl std::fmt::Display for LibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Parameter source ----
            LibError::MissingParameter { name } => {
                write!(f, "Missing required library parameter '{name}'")
            }
            LibError::Io { path, reason } => {
                write!(f, "I/O error at '{path}': {reason}")
            }
            LibError::Parse { path, reason } => {
                write!(f, "Malformed parameter file '{path}': {reason}")
            }

            // ---- Shape invariants ----
            LibError::RankMismatch { field, expected, found } => {
                write!(f, "Field '{field}' must have {expected} axes, found {found}")
            }
            LibError::ShapeMismatch { field, expected, found } => {
                write!(f, "Dimension mismatch for '{field}': expected {expected}, found {found}")
            }
            LibError::OddControlWidth { width } => {
                write!(
                    f,
                    "Width of 'shape/mu' must be even and non-zero (x, y per control point), got {width}"
                )
            }

            // ---- Normalization invariants ----
            LibError::NotNormalized { field, sum } => {
                write!(f, "Probabilities in '{field}' sum to {sum}, expected 1")
            }

            // ---- Accessors ----
            LibError::InvalidState { state, n } => {
                write!(f, "Invalid primitive state {state}: must be in [0, {n})")
            }
            LibError::InvalidRelation { rid, len } => {
                write!(f, "Invalid relation id {rid}: spatial model holds {len} histograms")
            }

            // ---- Spatial model ----
            LibError::EmptySpatialModel => {
                write!(f, "Spatial model must contain at least one histogram")
            }
            LibError::InvalidHistogram { reason } => {
                write!(f, "Invalid spatial histogram: {reason}")
            }

            // ---- Capabilities ----
            LibError::NotSupported { operation } => {
                write!(f, "Operation '{operation}' is not supported")
            }
        }
    }
}
