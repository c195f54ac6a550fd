//! library — loading and validating the model's hyperparameters.
//!
//! Purpose
//! -------
//! Own everything between a parameter source on disk and an immutable,
//! validated [`Library`]: the file encoding, the per-group schemas, the
//! storage ↔ native reindex of shape parameters, and the consistency checks.
//!
//! Key behaviors
//! -------------
//! - [`source`] decodes `<name>.json` array records and squeezes unit axes.
//! - [`params`] promotes group fields into typed structs
//!   ([`ShapeParams`], [`ScaleParams`], [`RelParams`], [`ParamGroup`]).
//! - [`reindex`] converts `shape/mu` and `shape/Sigma` between the stored and
//!   native layouts, in both directions.
//! - [`validation`] enforces dimension agreement and normalization.
//! - [`Library::load`] wires these together and also loads the
//!   [`SpatialModel`](crate::spatial::SpatialModel).
//! - [`SyntheticLibrary`] writes small valid sources for tests and demos.
//!
//! Invariants & assumptions
//! ------------------------
//! - Loading is all-or-nothing: any violation returns a [`LibError`] and no
//!   partially built library escapes.
//! - A loaded library is never mutated.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; `library::library` tests load
//!   synthetic sources from `tempfile` directories and corrupt them one
//!   field at a time.

pub mod errors;
#[allow(clippy::module_inception)]
pub mod library;
pub mod params;
pub mod reindex;
pub mod source;
pub mod synthetic;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{LibError, LibResult};
pub use self::library::Library;
pub use self::params::{ParamGroup, RelParams, ScaleParams, ShapeParams};
pub use self::synthetic::SyntheticLibrary;
