//! spatial — histogram models of stroke start positions.
//!
//! - [`hist`]: [`SpatialHist`], one smoothed 2-D histogram (score, sample,
//!   fit).
//! - [`model`]: [`SpatialModel`], the ordered per-relation collection owned by
//!   the library.
//!
//! Errors are reported through the library error type
//! ([`LibError`](crate::library::errors::LibError)), since both types are
//! built exclusively while loading a library.

pub mod hist;
pub mod model;

pub use self::hist::SpatialHist;
pub use self::model::SpatialModel;
