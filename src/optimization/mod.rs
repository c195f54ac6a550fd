//! optimization — type optimizer and its error surface.
//!
//! Purpose
//! -------
//! Group the constrained gradient-ascent optimizer used to refine character
//! types together with the single error enum it reports through.
//!
//! Key behaviors
//! -------------
//! - [`type_optimizer`]: projected gradient ascent on `TypeLikelihood`
//!   scores, run through argmin.
//! - [`errors`]: `OptError` / `OptResult<T>`, normalizing option problems,
//!   degenerate scores, projection failures, type-model errors, and backend
//!   errors.
//!
//! Conventions
//! -----------
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw argmin errors.
//! - Front-ends typically import `optimization::prelude::*`.

pub mod errors;
pub mod type_optimizer;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_bpl::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::type_optimizer::prelude::*;
}
