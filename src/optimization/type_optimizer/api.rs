//! type_optimizer::api: public entrypoints for refining a character type.
//!
//! Validates the layout, rejects a degenerate starting type, drives the
//! argmin `Executor`, and writes the final iterate back into the caller's
//! instance only when the whole run succeeds.
use crate::optimization::{
    errors::{OptError, OptResult},
    type_optimizer::{
        adapter::{Objective, TypeAdapter},
        solver::ProjectedGradientAscent,
        traits::{Parameterized, TypeLikelihood, TypeOptOptions, TypeOptOutcome},
        validation::validate_theta_hat,
    },
};
use argmin::core::{Executor, OptimizationResult, State};
use argmin_math::ArgminL2Norm;

/// Iterations between progress events for [`optimize_type`].
pub const DEFAULT_LOG_EVERY: usize = 100;

/// Refine the continuous parameters of `c` by gradient ascent on its score
/// under `dist`, returning the score recorded at every iteration.
///
/// With `proj_grad_ascent` each step is followed by a projection onto the
/// feasible set of every parameter block; otherwise the penalized objective
/// `s(Π(θ)) − ‖θ − Π(θ)‖² / (2·eps)` is ascended without projection and its
/// values are recorded instead.
///
/// `c` is updated in place with the final iterate on success. Its discrete
/// structure never changes.
///
/// # Errors
/// - Option errors for a non-positive `learning_rate`/`eps` or `n_iter == 0`.
/// - [`OptError::DegenerateType`](crate::optimization::errors::OptError::DegenerateType)
///   if the score is not finite. The score of `c` itself is checked before
///   any update in both modes, so a degenerate start leaves `c` untouched.
/// - [`OptError::ProjectionFailure`](crate::optimization::errors::OptError::ProjectionFailure)
///   if a block cannot be repaired; the error carries the scores so far.
pub fn optimize_type<D: TypeLikelihood>(
    c: &mut D::Type, dist: &D, learning_rate: f64, n_iter: usize, eps: f64,
    proj_grad_ascent: bool,
) -> OptResult<Vec<f64>> {
    let opts =
        TypeOptOptions::new(learning_rate, n_iter, eps, proj_grad_ascent, Some(DEFAULT_LOG_EVERY))?;
    Ok(optimize_type_with(c, dist, &opts)?.scores)
}

/// [`optimize_type`] with explicit options and full diagnostics.
///
/// On any error `c` is left exactly as it was passed in.
///
/// # Errors
/// Same as [`optimize_type`], plus layout and length errors reported by
/// the instance itself.
pub fn optimize_type_with<D: TypeLikelihood>(
    c: &mut D::Type, dist: &D, opts: &TypeOptOptions,
) -> OptResult<TypeOptOutcome> {
    let layout = c.layout();
    layout.validate()?;
    let theta0 = c.theta();
    layout.check_len(&theta0)?;

    // Raw score at the caller's point; the penalized objective stays finite
    // on an infeasible start and cannot be used for this check.
    let start = dist.score(c)?;
    if !start.is_finite() {
        return Err(OptError::DegenerateType { iteration: 0, value: start });
    }

    let objective =
        if opts.proj_grad_ascent { Objective::Projected } else { Objective::Penalized };
    tracing::debug!(
        dim = layout.dim(),
        blocks = layout.blocks().len(),
        n_iter = opts.n_iter,
        ?objective,
        "starting type optimization"
    );
    let problem = TypeAdapter::new(dist, c, opts.eps, objective);
    let solver = ProjectedGradientAscent::new(
        opts.learning_rate,
        opts.eps,
        layout,
        opts.proj_grad_ascent,
        opts.log_every,
    );

    let OptimizationResult { solver, mut state, .. } = Executor::new(problem, solver)
        .configure(|state| state.param(theta0).max_iters(opts.n_iter as u64))
        .run()?;

    let iterations = state.get_iter() as usize;
    let fn_evals = state.get_func_counts().clone();
    let grad_norm = state.take_gradient().map(|g| g.l2_norm());
    let theta_hat = validate_theta_hat(state.take_param())?;
    c.set_theta(&theta_hat)?;

    let scores = solver.into_scores();
    tracing::info!(
        iterations,
        first = scores.first().copied().unwrap_or(f64::NAN),
        last = scores.last().copied().unwrap_or(f64::NAN),
        "finished type optimization"
    );
    Ok(TypeOptOutcome { scores, theta_hat, iterations, fn_evals, grad_norm })
}
