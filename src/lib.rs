//! rust_bpl — parameter library and type optimizer for a Bayesian Program
//! Learning model of handwritten characters.
//!
//! Purpose
//! -------
//! Serve as the crate root for the hierarchical generative model of
//! character strokes: load its hyperparameters from disk, sample and score
//! character types, and refine a sampled type by constrained gradient
//! ascent on its score.
//!
//! Key behaviors
//! -------------
//! - [`library`]: load and validate the parameter source into an immutable
//!   [`library::Library`].
//! - [`spatial`]: 2-D histograms over stroke start positions.
//! - [`ctd`]: character types and the distribution over them.
//! - [`optimization`]: `optimize_type` with projection onto feasible sets.
//! - [`utils`]: log-probability helpers shared by the modules above.
//!
//! Invariants & assumptions
//! ------------------------
//! - Everything is single-threaded and synchronous. A library is loaded once
//!   and shared read-only.
//! - Failures are returned as per-module error enums (`LibError`,
//!   `TypeError`, `OptError`) with `From` conversions between layers.
//!
//! Conventions
//! -----------
//! - Arrays are `ndarray` values; shape parameters are kept in native
//!   (point-major) order once loaded.
//! - Logging goes through `tracing`; installing a subscriber is left to
//!   binaries.
//!
//! Downstream usage
//! ----------------
//! - Typical flow: `Library::load(dir)` → `CharacterTypeDist::new(&lib)` →
//!   `dist.sample_type(Some(k), &mut rng)` → `optimize_type(&mut c, &dist,
//!   lr, n_iter, eps, true)`.
//! - The `bpl_optimize_type` binary runs this flow from the command line.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` holds the end-to-end and
//!   degenerate-type scenarios on a synthetic library.

pub mod ctd;
pub mod library;
pub mod optimization;
pub mod spatial;
pub mod utils;
