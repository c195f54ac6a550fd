//! Public API surface for constrained type optimization.
//!
//! - [`Parameterized`]: a model instance whose continuous parameters can be
//!   read and written as a flat vector with a block layout.
//! - [`TypeLikelihood`]: a distribution that scores instances and returns the
//!   analytic gradient of the score.
//! - [`TypeOptOptions`]: run configuration.
//! - [`TypeOptOutcome`]: result of a completed run.
//!
//! Convention: we *maximize* the score `s(θ)` by minimizing the cost
//! `c(θ) = -s(θ)`. Gradients returned by [`TypeLikelihood::score_grad`] are
//! for the score; the adapter flips the sign.
use crate::optimization::{
    errors::OptResult,
    type_optimizer::{
        types::{FnEvalMap, Grad, ParamLayout, Score, Theta},
        validation::{verify_eps, verify_learning_rate, verify_log_every, verify_n_iter},
    },
};

/// A model instance with a fixed discrete structure and a flat vector of
/// continuous parameters.
///
/// Required:
/// - `layout()`: blocks and constraints of `theta()`, in order. Must depend
///   only on the discrete structure.
/// - `theta()`: current parameters, `layout().dim()` long.
/// - `set_theta(&Theta)`: overwrite the parameters. Must reject a vector of
///   the wrong length and must not change the discrete structure.
pub trait Parameterized: Clone {
    fn layout(&self) -> ParamLayout;
    fn theta(&self) -> Theta;
    fn set_theta(&mut self, theta: &Theta) -> OptResult<()>;
}

/// Distribution over [`Parameterized`] instances.
///
/// - `score(&Type)`: log-probability; may be `-∞` for impossible instances.
/// - `score_grad(&Type)`: gradient of `score` with respect to `theta()`, in
///   layout order.
///   - Errors: return a descriptive `OptError` for structural problems.
pub trait TypeLikelihood {
    type Type: Parameterized;

    fn score(&self, instance: &Self::Type) -> OptResult<Score>;
    fn score_grad(&self, instance: &Self::Type) -> OptResult<Grad>;
}

/// Optimizer configuration.
///
/// Fields:
/// - `learning_rate`: ascent step size.
/// - `n_iter`: number of iterations (one recorded score each).
/// - `eps`: feasibility margin used by projections and the penalty weight
///   `1 / (2·eps)` of the unconstrained mode.
/// - `proj_grad_ascent`: project after every step (`true`) or optimize the
///   penalized objective without projecting (`false`).
/// - `log_every`: emit a progress event every this many iterations.
///
/// Default: `(1e-3, 1000, 1e-4, true, Some(100))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeOptOptions {
    pub learning_rate: f64,
    pub n_iter: usize,
    pub eps: f64,
    pub proj_grad_ascent: bool,
    pub log_every: Option<usize>,
}

impl TypeOptOptions {
    /// Construct validated options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLearningRate`](crate::optimization::errors::OptError::InvalidLearningRate)
    ///   / [`OptError::InvalidEps`](crate::optimization::errors::OptError::InvalidEps)
    ///   for non-finite or non-positive values.
    /// - [`OptError::InvalidNIter`](crate::optimization::errors::OptError::InvalidNIter)
    ///   if `n_iter == 0`.
    /// - [`OptError::InvalidLogEvery`](crate::optimization::errors::OptError::InvalidLogEvery)
    ///   for `Some(0)`.
    pub fn new(
        learning_rate: f64, n_iter: usize, eps: f64, proj_grad_ascent: bool,
        log_every: Option<usize>,
    ) -> OptResult<Self> {
        verify_learning_rate(learning_rate)?;
        verify_n_iter(n_iter)?;
        verify_eps(eps)?;
        verify_log_every(log_every)?;
        Ok(Self { learning_rate, n_iter, eps, proj_grad_ascent, log_every })
    }
}

impl Default for TypeOptOptions {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            n_iter: 1000,
            eps: 1e-4,
            proj_grad_ascent: true,
            log_every: Some(100),
        }
    }
}

/// Result of a completed type optimization.
///
/// - `scores`: objective value at the start of every iteration, in order
///   (the score in projected mode, the penalized objective otherwise).
/// - `theta_hat`: final parameters written back into the instance.
/// - `iterations`: number of iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - `grad_norm`: norm of the last score gradient, if available.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeOptOutcome {
    pub scores: Vec<f64>,
    pub theta_hat: Theta,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl TypeOptOutcome {
    pub fn first_score(&self) -> Option<f64> {
        self.scores.first().copied()
    }

    pub fn last_score(&self) -> Option<f64> {
        self.scores.last().copied()
    }
}
