//! type_optimizer — constrained gradient ascent on character-type scores.
//!
//! Purpose
//! -------
//! Refine the continuous parameters of a sampled type (stroke shapes, scales,
//! attachment positions) so that its score under a type distribution
//! increases, while keeping the discrete structure fixed and every parameter
//! inside its feasible set. Callers implement [`Parameterized`] for the
//! instance and [`TypeLikelihood`] for the distribution, then invoke
//! [`optimize_type`].
//!
//! Key behaviors
//! -------------
//! - Flatten the instance's continuous parameters into a [`Theta`] described
//!   by a [`ParamLayout`] of constrained blocks ([`Constraint`]).
//! - Bridge the score into argmin as a cost `c(θ) = -s(θ)` via
//!   [`adapter::TypeAdapter`], and run the fixed-step
//!   [`solver::ProjectedGradientAscent`] through argmin's `Executor`.
//! - After every step, project each block back onto its feasible set
//!   ([`projection`]) or, in the unconstrained mode, ascend a penalized
//!   objective instead.
//! - Record one score per iteration and write the final iterate back into
//!   the instance on success.
//!
//! Invariants & assumptions
//! ------------------------
//! - The layout depends only on the discrete structure; it never changes
//!   during a run.
//! - With projection enabled, every evaluated iterate is feasible.
//! - On any error the caller's instance is left unmodified.
//!
//! Conventions
//! -----------
//! - Users implement the score and its gradient, never the cost.
//! - Covariance blocks are stored row-major as `dim × dim` entries.
//! - Progress is reported through `tracing` events; this module never
//!   prints.
//!
//! Downstream usage
//! ----------------
//! - `ctd::CharacterTypeDist` implements [`TypeLikelihood`] with
//!   `ctd::Character` as its instance type.
//! - The `bpl_optimize_type` binary wires library loading, sampling, and
//!   [`optimize_type`] together.
//!
//! Testing notes
//! -------------
//! - Unit tests cover projections on hand-checked cases, sign conventions in
//!   the adapter, solver bookkeeping on a quadratic bowl, and end-to-end runs
//!   on a toy concave model with simplex and covariance blocks.

pub mod adapter;
pub mod api;
pub mod projection;
pub mod solver;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{DEFAULT_LOG_EVERY, optimize_type, optimize_type_with};
pub use self::traits::{Parameterized, TypeLikelihood, TypeOptOptions, TypeOptOutcome};
pub use self::types::{Constraint, FnEvalMap, Grad, ParamBlock, ParamLayout, Score, Theta};

pub mod prelude {
    pub use super::api::{optimize_type, optimize_type_with};
    pub use super::traits::{Parameterized, TypeLikelihood, TypeOptOptions, TypeOptOutcome};
    pub use super::types::{Constraint, Grad, ParamLayout, Theta};
}
