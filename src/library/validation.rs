//! Consistency checks for an assembled parameter library.
//!
//! These helpers run after every group has been loaded and reindexed, and
//! enforce the cross-field invariants that make the library usable:
//!
//! - **Primitive count**: every per-primitive field shares the leading
//!   dimension `N` of `shape/mu` ([`check_primitive_count`]).
//! - **Start distribution**: `Σ exp(logStart) = 1` within
//!   [`NORMALIZATION_TOL`] ([`check_log_start`]).
//! - **Transitions**: every row of `logT`, normalized, sums to one
//!   ([`check_transitions`]); this rejects rows that are entirely `-∞` or
//!   contain `NaN`.
//!
//! Each check returns the first violation as a [`LibError`].
use crate::{
    library::{
        errors::{LibError, LibResult},
        params::{ScaleParams, ShapeParams},
    },
    utils::{NORMALIZATION_TOL, normalize_log_probs, sums_to_one},
};
use ndarray::{Array1, Array2};

/// Verify that every per-primitive field has leading dimension `n`.
///
/// # Errors
/// Returns [`LibError::ShapeMismatch`] naming the first disagreeing field.
pub fn check_primitive_count(
    n: usize, shape: &ShapeParams, scale: &ScaleParams, log_t: &Array2<f64>,
    log_start: &Array1<f64>,
) -> LibResult<()> {
    let dims = [
        ("shape/Sigma", shape.sigma.dim().0),
        ("shape/mixprob", shape.mixprob.len()),
        ("shape/freq", shape.freq.len()),
        ("shape/vsd", shape.vsd.len()),
        ("scale/theta", scale.theta.nrows()),
        ("logT", log_t.nrows()),
        ("logT", log_t.ncols()),
        ("logStart", log_start.len()),
    ];
    for (field, found) in dims {
        if found != n {
            return Err(LibError::ShapeMismatch { field: field.to_string(), expected: n, found });
        }
    }
    Ok(())
}

/// Verify that `exp(logStart)` is a probability vector.
///
/// # Errors
/// Returns [`LibError::NotNormalized`] with the observed sum.
pub fn check_log_start(log_start: &Array1<f64>) -> LibResult<()> {
    let sum: f64 = log_start.iter().map(|v| v.exp()).sum();
    if (sum - 1.0).abs() > NORMALIZATION_TOL || !sum.is_finite() {
        return Err(LibError::NotNormalized { field: "logStart".to_string(), sum });
    }
    Ok(())
}

/// Verify that every normalized transition row is a probability vector.
///
/// # Errors
/// Returns [`LibError::NotNormalized`] for the first failing row.
pub fn check_transitions(log_t: &Array2<f64>) -> LibResult<()> {
    for (state, row) in log_t.outer_iter().enumerate() {
        let p = normalize_log_probs(row);
        if !sums_to_one(p.view()) {
            return Err(LibError::NotNormalized { field: format!("logT[{state}]"), sum: p.sum() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // `logStart` must exponentiate to a distribution within tolerance.
    //
    // Given
    // -----
    // - A uniform log vector, a slightly perturbed one, and one off by 10%.
    //
    // Expect
    // ------
    // - The first two pass; the last fails with its sum reported.
    fn log_start_tolerance_is_enforced() {
        let uniform = Array1::from_elem(4, 0.25f64.ln());
        let nudged = array![0.25f64.ln() + 1e-8, 0.25f64.ln(), 0.25f64.ln(), 0.25f64.ln()];
        let off = Array1::from_elem(4, 0.275f64.ln());

        assert!(check_log_start(&uniform).is_ok());
        assert!(check_log_start(&nudged).is_ok());
        match check_log_start(&off) {
            Err(LibError::NotNormalized { field, sum }) => {
                assert_eq!(field, "logStart");
                assert!((sum - 1.1).abs() < 1e-9);
            }
            other => panic!("expected NotNormalized, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Unnormalized but finite rows are accepted; empty-support rows are not.
    fn transitions_reject_empty_support_rows() {
        let ok = array![[0.0, 1.0], [3.0, -2.0]];
        let bad = array![[0.0, 0.0], [f64::NEG_INFINITY, f64::NEG_INFINITY]];

        assert!(check_transitions(&ok).is_ok());
        assert!(matches!(
            check_transitions(&bad),
            Err(LibError::NotNormalized { ref field, .. }) if field == "logT[1]"
        ));
    }
}
