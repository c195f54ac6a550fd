//! Multivariate normal prior over the flattened control points of one
//! primitive, backed by a Cholesky factorization.
use crate::ctd::errors::{TypeError, TypeResult};
use nalgebra::{DMatrix, DVector};
use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveGaussian {
    mean: DVector<f64>,
    chol_l: DMatrix<f64>,
    precision: DMatrix<f64>,
    log_norm: f64,
}

impl PrimitiveGaussian {
    /// Factor `sigma` and cache the precision and normalizing constant.
    ///
    /// # Errors
    /// - [`TypeError::NotPositiveDefinite`] if `sigma` has no Cholesky factor
    ///   or `mean`/`sigma` contain non-finite entries.
    /// - [`TypeError::StructureMismatch`] if the dimensions disagree.
    pub fn new(
        primitive: usize, mean: ArrayView1<'_, f64>, sigma: ArrayView2<'_, f64>,
    ) -> TypeResult<Self> {
        let d = mean.len();
        if sigma.dim() != (d, d) {
            return Err(TypeError::StructureMismatch {
                reason: "covariance does not match mean dimension",
            });
        }
        if mean.iter().chain(sigma.iter()).any(|v| !v.is_finite()) {
            return Err(TypeError::NotPositiveDefinite { primitive });
        }
        let cov = DMatrix::from_fn(d, d, |i, j| sigma[[i, j]]);
        let chol = cov.cholesky().ok_or(TypeError::NotPositiveDefinite { primitive })?;
        let chol_l = chol.l();
        let log_det = 2.0 * chol_l.diagonal().iter().map(|v| v.ln()).sum::<f64>();
        let precision = chol.inverse();
        Ok(Self {
            mean: DVector::from_iterator(d, mean.iter().copied()),
            chol_l,
            precision,
            log_norm: -0.5 * (d as f64 * (2.0 * PI).ln() + log_det),
        })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Log-density at `x`.
    pub fn ln_pdf(&self, x: &DVector<f64>) -> f64 {
        let diff = x - &self.mean;
        self.log_norm - 0.5 * diff.dot(&(&self.precision * &diff))
    }

    /// Gradient of the log-density, `−Σ⁻¹ (x − μ)`.
    pub fn grad_ln_pdf(&self, x: &DVector<f64>) -> DVector<f64> {
        -(&self.precision * (x - &self.mean))
    }

    /// Draw `μ + L z` with `z ~ N(0, I)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DVector<f64> {
        let z = DVector::from_fn(self.dim(), |_, _| rng.sample::<f64, _>(StandardNormal));
        &self.mean + &self.chol_l * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    // Purpose
    // -------
    // Verify the log-density and gradient against closed forms for a
    // diagonal covariance.
    //
    // Given
    // -----
    // - μ = (1, −1), Σ = diag(4, 1), x = (3, 0).
    //
    // Expect
    // ------
    // - ln p = −ln(2π) − ln 2 − ½(1 + 1).
    // - ∇ = (−0.5, −1).
    fn ln_pdf_matches_diagonal_closed_form() {
        // Arrange
        let sigma = array![[4.0, 0.0], [0.0, 1.0]];
        let g = PrimitiveGaussian::new(0, array![1.0, -1.0].view(), sigma.view()).unwrap();
        let x = DVector::from_vec(vec![3.0, 0.0]);

        // Act
        let lp = g.ln_pdf(&x);
        let grad = g.grad_ln_pdf(&x);

        // Assert
        assert_relative_eq!(lp, -(2.0 * PI).ln() - 2f64.ln() - 1.0, epsilon = 1e-12);
        assert_relative_eq!(grad[0], -0.5, epsilon = 1e-12);
        assert_relative_eq!(grad[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Indefinite or undefined covariances are rejected with the primitive id.
    fn rejects_non_positive_definite() {
        let indefinite = array![[1.0, 2.0], [2.0, 1.0]];
        let identity = array![[1.0, 0.0], [0.0, 1.0]];

        let a = PrimitiveGaussian::new(3, array![0.0, 0.0].view(), indefinite.view());
        let b = PrimitiveGaussian::new(4, array![f64::NAN, 0.0].view(), identity.view());

        assert_eq!(a, Err(TypeError::NotPositiveDefinite { primitive: 3 }));
        assert_eq!(b, Err(TypeError::NotPositiveDefinite { primitive: 4 }));
    }

    #[test]
    // Purpose
    // -------
    // The sample mean of many draws approaches μ.
    fn sample_mean_approaches_mu() {
        let sigma = array![[0.5, 0.1], [0.1, 0.2]];
        let g = PrimitiveGaussian::new(0, array![2.0, -3.0].view(), sigma.view()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let n = 20_000;
        let total = (0..n).fold(DVector::zeros(2), |acc, _| acc + g.sample(&mut rng));
        let mean = total / n as f64;

        assert_relative_eq!(mean[0], 2.0, epsilon = 0.03);
        assert_relative_eq!(mean[1], -3.0, epsilon = 0.03);
    }
}
