//! ctd — character types and the prior distribution over them.
//!
//! Purpose
//! -------
//! Define what a character type is ([`Character`], [`StrokeType`],
//! [`Relation`]) and the distribution [`CharacterTypeDist`] that samples,
//! scores, and differentiates types using the hyperparameters of a loaded
//! [`Library`](crate::library::Library).
//!
//! Key behaviors
//! -------------
//! - [`gaussian`] wraps a Cholesky-factored multivariate normal for the
//!   control points of one primitive.
//! - [`character`] implements the optimizer's `Parameterized` interface.
//! - [`type_dist`] implements the optimizer's `TypeLikelihood` interface.
//! - [`errors`] holds [`TypeError`] / [`TypeResult`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The distribution borrows the library read-only; any number of
//!   distributions and characters can share one library.

pub mod character;
pub mod errors;
pub mod gaussian;
pub mod type_dist;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::character::{Character, Relation, StrokeType};
pub use self::errors::{TypeError, TypeResult};
pub use self::gaussian::PrimitiveGaussian;
pub use self::type_dist::CharacterTypeDist;
