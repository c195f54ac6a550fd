//! type_optimizer::projection — mapping parameters back onto feasible sets.
//!
//! Purpose
//! -------
//! Implement the Euclidean-style projection applied after every ascent step
//! (and inside the penalty of the unconstrained mode). Each block of a
//! [`ParamLayout`] is projected independently according to its
//! [`Constraint`], with a margin `eps` that keeps iterates strictly inside
//! open sets.
//!
//! Key behaviors
//! -------------
//! - `LowerBound(lb)`: clamp to `≥ lb + eps`.
//! - `Interval { lo, hi }`: clamp to `[lo + eps, hi − eps]`.
//! - `Simplex`: sort-based projection onto `{x ≥ eps, Σx = 1}`.
//! - `Covariance { dim }`: symmetrize, clip eigenvalues at `eps`, rebuild,
//!   and confirm with a Cholesky factorization.
//!
//! Invariants & assumptions
//! ------------------------
//! - A successful projection returns a vector for which
//!   [`is_feasible`] holds with tolerance `eps`.
//! - Any non-finite entry, an interval narrower than `2·eps`, a simplex too
//!   short to hold `len·eps`, or a covariance that stays indefinite after
//!   clipping is a [`OptError::ProjectionFailure`]. Its `scores` field is
//!   left empty here and filled in by the solver.
use crate::optimization::{
    errors::{OptError, OptResult},
    type_optimizer::types::{Constraint, ParamBlock, ParamLayout, Theta},
};
use nalgebra::DMatrix;
use ndarray::{ArrayView1, ArrayViewMut1};

/// Project every block of `theta` in place.
///
/// # Errors
/// - [`OptError::ThetaLengthMismatch`] if `theta` does not match `layout`.
/// - [`OptError::ProjectionFailure`] naming the first block that cannot be
///   projected.
pub fn project_in_place(theta: &mut Theta, layout: &ParamLayout, eps: f64) -> OptResult<()> {
    layout.check_len(theta)?;
    for block in layout.blocks() {
        let view = theta.slice_mut(ndarray::s![block.range()]);
        project_block(view, block, eps)?;
    }
    Ok(())
}

/// Projected copy of `theta`.
///
/// # Errors
/// Same as [`project_in_place`].
pub fn project(theta: &Theta, layout: &ParamLayout, eps: f64) -> OptResult<Theta> {
    let mut out = theta.clone();
    project_in_place(&mut out, layout, eps)?;
    Ok(out)
}

/// `true` if every block of `theta` lies in its feasible set, allowing
/// `tol` slack on sums and symmetry.
pub fn is_feasible(theta: &Theta, layout: &ParamLayout, tol: f64) -> bool {
    if theta.len() != layout.dim() {
        return false;
    }
    layout.blocks().iter().all(|block| {
        let x = theta.slice(ndarray::s![block.range()]);
        x.iter().all(|v| v.is_finite()) && block_feasible(x, block.constraint, tol)
    })
}

// ---- Per-block projections ----

fn project_block(mut x: ArrayViewMut1<'_, f64>, block: &ParamBlock, eps: f64) -> OptResult<()> {
    let fail = |reason: &'static str| OptError::ProjectionFailure {
        block: block.label.clone(),
        reason,
        scores: Vec::new(),
    };
    if x.iter().any(|v| !v.is_finite()) {
        return Err(fail("non-finite parameter"));
    }
    match block.constraint {
        Constraint::Free => {}
        Constraint::LowerBound(lb) => x.mapv_inplace(|v| v.max(lb + eps)),
        Constraint::Interval { lo, hi } => {
            let (lo, hi) = (lo + eps, hi - eps);
            if lo > hi {
                return Err(fail("interval is narrower than the tolerance margin"));
            }
            x.mapv_inplace(|v| v.clamp(lo, hi));
        }
        Constraint::Simplex => {
            let mass = 1.0 - x.len() as f64 * eps;
            if mass <= 0.0 {
                return Err(fail("simplex cannot hold the tolerance floor"));
            }
            let shifted: Vec<f64> = x.iter().map(|v| v - eps).collect();
            let z = project_onto_simplex(&shifted, mass);
            for (xi, zi) in x.iter_mut().zip(z) {
                *xi = zi + eps;
            }
            if (x.sum() - 1.0).abs() > eps {
                return Err(fail("simplex projection lost normalization"));
            }
        }
        Constraint::Covariance { dim } => {
            let values: Vec<f64> = x.iter().copied().collect();
            let m = DMatrix::from_row_slice(dim, dim, &values);
            let sym = (&m + m.transpose()) * 0.5;
            let mut eig = sym.symmetric_eigen();
            for lambda in eig.eigenvalues.iter_mut() {
                *lambda = lambda.max(eps);
            }
            let rebuilt = eig.recompose();
            let rebuilt = (&rebuilt + rebuilt.transpose()) * 0.5;
            if rebuilt.iter().any(|v| !v.is_finite()) || rebuilt.clone().cholesky().is_none() {
                return Err(fail("covariance is not positive definite after eigenvalue clipping"));
            }
            for i in 0..dim {
                for j in 0..dim {
                    x[i * dim + j] = rebuilt[(i, j)];
                }
            }
        }
    }
    Ok(())
}

/// Euclidean projection of `y` onto `{z ≥ 0, Σz = mass}`.
fn project_onto_simplex(y: &[f64], mass: f64) -> Vec<f64> {
    let mut sorted = y.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let mut cumsum = 0.0;
    let mut tau = 0.0;
    for (j, &u) in sorted.iter().enumerate() {
        cumsum += u;
        let candidate = (cumsum - mass) / (j + 1) as f64;
        if u - candidate > 0.0 {
            tau = candidate;
        }
    }
    y.iter().map(|v| (v - tau).max(0.0)).collect()
}

fn block_feasible(x: ArrayView1<'_, f64>, constraint: Constraint, tol: f64) -> bool {
    match constraint {
        Constraint::Free => true,
        Constraint::LowerBound(lb) => x.iter().all(|&v| v > lb),
        Constraint::Interval { lo, hi } => x.iter().all(|&v| v > lo && v < hi),
        Constraint::Simplex => x.iter().all(|&v| v >= 0.0) && (x.sum() - 1.0).abs() <= tol,
        Constraint::Covariance { dim } => {
            let values: Vec<f64> = x.iter().copied().collect();
            let m = DMatrix::from_row_slice(dim, dim, &values);
            (&m - m.transpose()).amax() <= tol && m.cholesky().is_some()
        }
    }
}
