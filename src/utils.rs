//! Shared numeric helpers for log-probability vectors.
//!
//! Used by the library validator, the type distribution, and the spatial
//! histogram. All helpers are total: degenerate inputs yield `NaN`/`-∞`
//! rather than panicking, and callers decide what is fatal.
use ndarray::{Array1, ArrayView1};

/// Absolute tolerance for "sums to one" checks.
pub const NORMALIZATION_TOL: f64 = 1e-6;

/// `ln Σ exp(x)` with max-shift; `-∞` for empty or all-`-∞` input.
pub fn log_sum_exp(x: ArrayView1<'_, f64>) -> f64 {
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if !max.is_finite() {
        return max;
    }
    max + x.iter().map(|&v| (v - max).exp()).sum::<f64>().ln()
}

/// Normalize log-weights into probabilities, `exp(x) / Σ exp(x)`.
///
/// Entries of `-∞` map to zero. If no entry is finite the result is all
/// `NaN`, which downstream normalization checks reject.
pub fn normalize_log_probs(x: ArrayView1<'_, f64>) -> Array1<f64> {
    let lse = log_sum_exp(x);
    if !lse.is_finite() {
        return Array1::from_elem(x.len(), f64::NAN);
    }
    x.mapv(|v| (v - lse).exp())
}

/// Normalize non-negative weights into probabilities.
///
/// Returns `None` when the total is zero or not finite.
pub fn normalize_weights(w: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
    let total: f64 = w.sum();
    if !(total.is_finite() && total > 0.0) || w.iter().any(|&v| v < 0.0 || v.is_nan()) {
        return None;
    }
    Some(w.mapv(|v| v / total))
}

/// `|Σ p − 1| ≤ NORMALIZATION_TOL`.
pub fn sums_to_one(p: ArrayView1<'_, f64>) -> bool {
    (p.sum() - 1.0).abs() <= NORMALIZATION_TOL
}
