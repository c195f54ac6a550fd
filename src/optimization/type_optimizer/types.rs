//! type_optimizer::types — numeric aliases and the constrained parameter layout.
//!
//! Purpose
//! -------
//! Centralize the vector aliases used by the type optimizer and describe how
//! a flat parameter vector `θ` splits into blocks, each with its own feasible
//! set. The layout is the only information the projection and the penalty
//! need about a model.
//!
//! Key behaviors
//! -------------
//! - [`Theta`], [`Grad`], [`Score`], [`FnEvalMap`] mirror the shapes used by
//!   the argmin backend.
//! - [`Constraint`] enumerates the feasible sets: unconstrained, lower bound,
//!   interval, probability simplex, and symmetric positive-definite matrix.
//! - [`ParamLayout`] assigns contiguous offsets to labelled blocks in push
//!   order and validates them.
//!
//! Invariants & assumptions
//! ------------------------
//! - Blocks tile `θ` exactly: offsets are contiguous and `dim()` is the sum
//!   of block lengths.
//! - A `Covariance { dim }` block stores a `dim × dim` matrix row-major, so
//!   its length is `dim²`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover offset assignment and each validation rule.
use crate::optimization::errors::{OptError, OptResult};
use ndarray::Array1;
use std::collections::HashMap;

/// Flat vector of a model's continuous parameters.
pub type Theta = Array1<f64>;

/// Gradient of the score (or of the cost), same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Log-probability of a character type under the prior.
pub type Score = f64;

/// Function-evaluation counters as reported by the solver.
pub type FnEvalMap = HashMap<String, u64>;

/// Feasible set of one parameter block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// No restriction.
    Free,
    /// Every entry strictly above the bound.
    LowerBound(f64),
    /// Every entry strictly inside `(lo, hi)`.
    Interval { lo: f64, hi: f64 },
    /// Non-negative entries summing to one.
    Simplex,
    /// Symmetric positive-definite `dim × dim` matrix, row-major.
    Covariance { dim: usize },
}

/// A labelled, contiguous slice `θ[offset .. offset + len]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBlock {
    pub label: String,
    pub offset: usize,
    pub len: usize,
    pub constraint: Constraint,
}

impl ParamBlock {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Ordered blocks covering a parameter vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamLayout {
    blocks: Vec<ParamBlock>,
    dim: usize,
}

impl ParamLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block of `len` entries after the existing ones.
    pub fn push(&mut self, label: impl Into<String>, len: usize, constraint: Constraint) {
        self.blocks.push(ParamBlock { label: label.into(), offset: self.dim, len, constraint });
        self.dim += len;
    }

    pub fn blocks(&self) -> &[ParamBlock] {
        &self.blocks
    }

    /// Total number of parameters.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Check every block's constraint against its length.
    ///
    /// # Errors
    /// Returns [`OptError::InvalidLayout`] for the first block whose bounds are
    /// non-finite or empty, whose simplex is empty, or whose covariance length
    /// is not `dim²`.
    pub fn validate(&self) -> OptResult<()> {
        for block in &self.blocks {
            let invalid =
                |reason: &'static str| OptError::InvalidLayout { block: block.label.clone(), reason };
            match block.constraint {
                Constraint::Free => {}
                Constraint::LowerBound(lb) => {
                    if !lb.is_finite() {
                        return Err(invalid("lower bound must be finite"));
                    }
                }
                Constraint::Interval { lo, hi } => {
                    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
                        return Err(invalid("interval bounds must be finite with lo < hi"));
                    }
                }
                Constraint::Simplex => {
                    if block.len == 0 {
                        return Err(invalid("simplex must have at least one entry"));
                    }
                }
                Constraint::Covariance { dim } => {
                    if dim == 0 || block.len != dim * dim {
                        return Err(invalid("covariance block length must be dim²"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Check that `theta` has exactly `dim()` entries.
    ///
    /// # Errors
    /// Returns [`OptError::ThetaLengthMismatch`].
    pub fn check_len(&self, theta: &Theta) -> OptResult<()> {
        if theta.len() != self.dim {
            return Err(OptError::ThetaLengthMismatch { expected: self.dim, found: theta.len() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify that blocks receive contiguous offsets in push order.
    //
    // Given
    // -----
    // - Blocks of lengths 3, 2, 4.
    //
    // Expect
    // ------
    // - Offsets 0, 3, 5 and total dimension 9.
    fn push_assigns_contiguous_offsets() {
        // Arrange
        let mut layout = ParamLayout::new();

        // Act
        layout.push("a", 3, Constraint::Free);
        layout.push("b", 2, Constraint::Simplex);
        layout.push("c", 4, Constraint::Covariance { dim: 2 });

        // Assert
        let offsets: Vec<usize> = layout.blocks().iter().map(|b| b.offset).collect();
        assert_eq!(offsets, vec![0, 3, 5]);
        assert_eq!(layout.dim(), 9);
        assert_eq!(layout.blocks()[2].range(), 5..9);
        assert!(layout.validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Each malformed block is reported with its label.
    fn validate_rejects_malformed_blocks() {
        let cases = [
            (Constraint::Interval { lo: 1.0, hi: 1.0 }, 2),
            (Constraint::LowerBound(f64::NAN), 1),
            (Constraint::Simplex, 0),
            (Constraint::Covariance { dim: 2 }, 3),
        ];

        for (constraint, len) in cases {
            let mut layout = ParamLayout::new();
            layout.push("bad", len, constraint);
            assert!(matches!(
                layout.validate(),
                Err(OptError::InvalidLayout { ref block, .. }) if block == "bad"
            ));
        }
    }

    #[test]
    // Purpose
    // -------
    // Length checks compare against the layout dimension.
    fn check_len_reports_mismatch() {
        let mut layout = ParamLayout::new();
        layout.push("x", 2, Constraint::Free);

        assert!(layout.check_len(&array![1.0, 2.0]).is_ok());
        assert_eq!(
            layout.check_len(&array![1.0]),
            Err(OptError::ThetaLengthMismatch { expected: 2, found: 1 })
        );
    }
}
