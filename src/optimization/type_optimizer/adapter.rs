//! type_optimizer::adapter: argmin cost and gradient for a type likelihood.
//!
//! Maps parameter vectors onto a scratch copy of the instance, evaluates the
//! score (or its penalized form), and flips signs so argmin can minimize.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptResult,
    type_optimizer::{
        projection::project,
        traits::{Parameterized, TypeLikelihood},
        types::{Grad, ParamLayout, Score, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Objective optimized by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Plain score; feasibility is kept by projecting after each step.
    Projected,
    /// `s(Π(θ)) − ‖θ − Π(θ)‖² / (2·eps)`, with no projection of the iterate.
    Penalized,
}

/// Bridge between a [`TypeLikelihood`] and argmin's cost/gradient traits.
///
/// Argmin minimizes, so `cost(θ) = −objective(θ)` and
/// `gradient(θ) = −∇objective(θ)`. Parameters are written into a scratch
/// copy of the instance before each evaluation; the caller's instance is
/// never touched here.
///
/// A non-finite score is returned as a non-finite cost rather than an error,
/// so the solver can report the iteration at which the type degenerated.
pub struct TypeAdapter<'a, D: TypeLikelihood> {
    pub dist: &'a D,
    pub layout: ParamLayout,
    pub eps: f64,
    pub objective: Objective,
    scratch: RefCell<D::Type>,
}

impl<'a, D: TypeLikelihood> TypeAdapter<'a, D> {
    pub fn new(dist: &'a D, instance: &D::Type, eps: f64, objective: Objective) -> Self {
        Self {
            dist,
            layout: instance.layout(),
            eps,
            objective,
            scratch: RefCell::new(instance.clone()),
        }
    }

    /// Objective value at `theta` (score or penalized score).
    pub fn objective(&self, theta: &Theta) -> OptResult<Score> {
        match self.objective {
            Objective::Projected => self.score_at(theta),
            Objective::Penalized => {
                let p = project(theta, &self.layout, self.eps)?;
                let dist2 = (theta - &p).mapv(|d| d * d).sum();
                Ok(self.score_at(&p)? - dist2 / (2.0 * self.eps))
            }
        }
    }

    /// Gradient of the objective at `theta`.
    ///
    /// In penalized mode the projection is treated as the identity when
    /// differentiating the score term.
    pub fn objective_grad(&self, theta: &Theta) -> OptResult<Grad> {
        let grad = match self.objective {
            Objective::Projected => self.score_grad_at(theta)?,
            Objective::Penalized => {
                let p = project(theta, &self.layout, self.eps)?;
                self.score_grad_at(&p)? - (theta - &p) / self.eps
            }
        };
        validate_grad(&grad, self.layout.dim())?;
        Ok(grad)
    }

    fn score_at(&self, theta: &Theta) -> OptResult<Score> {
        let mut scratch = self.scratch.borrow_mut();
        scratch.set_theta(theta)?;
        self.dist.score(&scratch)
    }

    fn score_grad_at(&self, theta: &Theta) -> OptResult<Grad> {
        let mut scratch = self.scratch.borrow_mut();
        scratch.set_theta(theta)?;
        self.dist.score_grad(&scratch)
    }
}

impl<'a, D: TypeLikelihood> CostFunction for TypeAdapter<'a, D> {
    type Param = Theta;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(-self.objective(theta)?)
    }
}

impl<'a, D: TypeLikelihood> Gradient for TypeAdapter<'a, D> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(-self.objective_grad(theta)?)
    }
}
