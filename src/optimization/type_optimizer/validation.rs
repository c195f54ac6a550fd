//! Validation helpers for constrained type optimization.
//!
//! This module centralizes the consistency checks used by the optimizer:
//!
//! - **Option checks**: [`verify_learning_rate`], [`verify_eps`],
//!   [`verify_n_iter`], [`verify_log_every`] guard the run configuration.
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Final parameters**: [`validate_theta_hat`] ensures the final iterate
//!   exists and is finite before it is written back into a character.
//!
//! All helpers return domain-specific [`OptError`] variants.
use crate::optimization::{
    errors::{OptError, OptResult},
    type_optimizer::types::{Grad, Theta},
};

/// Validate the ascent step size.
///
/// # Errors
/// Returns [`OptError::InvalidLearningRate`] if the value is non-finite or ≤ 0.0.
pub fn verify_learning_rate(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidLearningRate {
            value,
            reason: "Learning rate must be finite.",
        });
    }
    if value <= 0.0 {
        return Err(OptError::InvalidLearningRate {
            value,
            reason: "Learning rate must be positive.",
        });
    }
    Ok(())
}

/// Validate the feasibility tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidEps`] if the value is non-finite or ≤ 0.0.
pub fn verify_eps(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidEps { value, reason: "Tolerance must be finite." });
    }
    if value <= 0.0 {
        return Err(OptError::InvalidEps { value, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// Validate the iteration count.
///
/// # Errors
/// Returns [`OptError::InvalidNIter`] if `n_iter == 0`.
pub fn verify_n_iter(n_iter: usize) -> OptResult<()> {
    if n_iter == 0 {
        return Err(OptError::InvalidNIter {
            n_iter,
            reason: "Number of iterations must be greater than zero.",
        });
    }
    Ok(())
}

/// Validate the optional progress-logging interval.
///
/// # Errors
/// Returns [`OptError::InvalidLogEvery`] for `Some(0)`.
pub fn verify_log_every(every: Option<usize>) -> OptResult<()> {
    match every {
        Some(0) => Err(OptError::InvalidLogEvery { every: 0 }),
        _ => Ok(()),
    }
}

/// Validate a gradient vector against dimension and finiteness.
///
/// Checks:
/// - `grad.len() == dim`
/// - every element is finite (`NaN` or `±∞` are rejected)
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap the final parameter vector.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value,
            reason: "Final parameters must be finite.",
        });
    }
    Ok(theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Option validators accept sane values and reject the rest.
    fn option_validators_enforce_ranges() {
        assert!(verify_learning_rate(1e-3).is_ok());
        assert!(matches!(verify_learning_rate(0.0), Err(OptError::InvalidLearningRate { .. })));
        assert!(matches!(verify_learning_rate(f64::NAN), Err(OptError::InvalidLearningRate { .. })));
        assert!(verify_eps(1e-4).is_ok());
        assert!(matches!(verify_eps(-1.0), Err(OptError::InvalidEps { .. })));
        assert!(verify_n_iter(1).is_ok());
        assert!(matches!(verify_n_iter(0), Err(OptError::InvalidNIter { n_iter: 0, .. })));
        assert!(verify_log_every(None).is_ok());
        assert_eq!(verify_log_every(Some(0)), Err(OptError::InvalidLogEvery { every: 0 }));
    }

    #[test]
    // Purpose
    // -------
    // Gradients must match the dimension and be finite.
    fn validate_grad_checks_dim_and_finiteness() {
        assert!(validate_grad(&array![1.0, -2.0], 2).is_ok());
        assert_eq!(
            validate_grad(&array![1.0], 2),
            Err(OptError::GradientDimMismatch { expected: 2, found: 1 })
        );
        assert!(matches!(
            validate_grad(&array![1.0, f64::INFINITY], 2),
            Err(OptError::InvalidGradient { index: 1, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The final iterate must exist and be finite.
    fn validate_theta_hat_requires_finite_vector() {
        assert_eq!(validate_theta_hat(Some(array![0.5])).unwrap(), array![0.5]);
        assert_eq!(validate_theta_hat(None), Err(OptError::MissingThetaHat));
        assert!(matches!(
            validate_theta_hat(Some(array![0.0, f64::NAN])),
            Err(OptError::InvalidThetaHat { index: 1, .. })
        ));
    }
}
