//! type_optimizer::solver — projected gradient ascent as an argmin solver.
//!
//! Purpose
//! -------
//! Implement the fixed-step ascent loop of type optimization on top of
//! argmin's `Solver` trait so that iteration counting, termination, and
//! function-evaluation bookkeeping come from the `Executor`.
//!
//! Key behaviors
//! -------------
//! - `init` evaluates the objective at `θ₀` and fails with
//!   [`OptError::DegenerateType`] (iteration 0) if it is not finite.
//! - Each `next_iter` records the objective of the current iterate, takes
//!   the step `θ ← θ + lr·∇objective(θ)`, projects the new iterate when
//!   projection is enabled, and evaluates the objective there for the next
//!   round.
//! - A failed projection becomes [`OptError::ProjectionFailure`] carrying the
//!   scores recorded so far.
//! - Every `log_every` iterations a `tracing` info event reports progress.
//!
//! Invariants & assumptions
//! ------------------------
//! - The state's cost always equals `−objective(param)` for the current
//!   param, so the recorded score never requires a second evaluation.
//! - After `n` iterations exactly `n` scores have been recorded.
use crate::optimization::{
    errors::OptError,
    type_optimizer::{
        projection::project_in_place,
        types::{Grad, ParamLayout, Theta},
    },
};
use argmin::{
    argmin_error_closure,
    core::{CostFunction, Error, Gradient, IterState, KV, Problem, Solver},
    kv,
};

/// argmin state used by the type optimizer.
pub type TypeState = IterState<Theta, Grad, (), (), (), f64>;

/// Fixed-step (projected) gradient ascent on the objective.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedGradientAscent {
    learning_rate: f64,
    eps: f64,
    layout: ParamLayout,
    project: bool,
    log_every: Option<usize>,
    scores: Vec<f64>,
}

impl ProjectedGradientAscent {
    pub fn new(
        learning_rate: f64, eps: f64, layout: ParamLayout, project: bool, log_every: Option<usize>,
    ) -> Self {
        Self { learning_rate, eps, layout, project, log_every, scores: Vec::new() }
    }

    /// Objective values recorded so far, one per completed iteration.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn into_scores(self) -> Vec<f64> {
        self.scores
    }
}

impl<O> Solver<O, TypeState> for ProjectedGradientAscent
where
    O: CostFunction<Param = Theta, Output = f64> + Gradient<Param = Theta, Gradient = Grad>,
{
    const NAME: &'static str = "Projected gradient ascent";

    fn init(
        &mut self, problem: &mut Problem<O>, mut state: TypeState,
    ) -> Result<(TypeState, Option<KV>), Error> {
        let theta = state.take_param().ok_or_else(argmin_error_closure!(
            NotInitialized,
            "Initial parameter vector required."
        ))?;
        let cost = problem.cost(&theta)?;
        if !cost.is_finite() {
            return Err(OptError::DegenerateType { iteration: 0, value: -cost }.into());
        }
        self.scores.clear();
        Ok((state.param(theta).cost(cost), None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, mut state: TypeState,
    ) -> Result<(TypeState, Option<KV>), Error> {
        let iteration = self.scores.len();
        let score = -state.get_cost();
        self.scores.push(score);
        if let Some(every) = self.log_every {
            if iteration % every == 0 {
                tracing::info!(iteration, score, "type optimization progress");
            }
        }

        let theta = state.take_param().ok_or_else(argmin_error_closure!(
            NotInitialized,
            "Parameter vector missing from state."
        ))?;
        let cost_grad = problem.gradient(&theta)?;
        let mut next = &theta - &(&cost_grad * self.learning_rate);
        if self.project {
            project_in_place(&mut next, &self.layout, self.eps)
                .map_err(|e| e.with_trajectory(&self.scores))?;
        }

        let cost = problem.cost(&next)?;
        if !cost.is_finite() {
            return Err(OptError::DegenerateType { iteration: iteration + 1, value: -cost }.into());
        }
        let kv = kv!("score" => score;);
        Ok((state.param(next).gradient(cost_grad).cost(cost), Some(kv)))
    }
}
