//! ctd::type_dist — prior over character types built from a [`Library`].
//!
//! Purpose
//! -------
//! Turn the library's hyperparameters into a generative distribution over
//! [`Character`] types that can sample a type, score one, and return the
//! analytic gradient of the score with respect to the continuous
//! parameters. This is the [`TypeLikelihood`] the type optimizer ascends.
//!
//! Key behaviors
//! -------------
//! - [`CharacterTypeDist::new`] precomputes everything that does not depend
//!   on a particular type: Cholesky factors of the shape covariances, gamma
//!   priors of the inverse scales, and normalized categorical priors over
//!   stroke counts, sub-stroke counts, start primitives, transitions, and
//!   relation kinds.
//! - [`CharacterTypeDist::sample_type`] draws a type stroke by stroke.
//! - [`CharacterTypeDist::score_type`] sums the log-probabilities of every
//!   choice made by `sample_type`.
//! - [`CharacterTypeDist::score_type_grad`] differentiates the score in the
//!   layout order of [`Character`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The first stroke is always independent; later strokes pick their
//!   relation kind from `rel.mixprob` (independent, start, end, mid).
//! - Attachments are uniform over earlier strokes; a mid-stroke attachment
//!   also picks a sub-stroke uniformly and an evaluation spot uniformly on
//!   `[0, ncpt]`.
//! - For a non-informative library (`isunif`) shapes contribute nothing to
//!   the score and are sampled from a standard normal.
//! - Impossible values (non-positive inverse scales, positions outside the
//!   spatial grid) score `-∞`; structural problems are errors.
//!
//! Downstream usage
//! ----------------
//! - Borrow a loaded library, build the distribution once, then sample and
//!   score any number of types. Pass `&dist` to `optimize_type`.
use crate::{
    ctd::{
        character::{Character, Relation, StrokeType},
        errors::{TypeError, TypeResult},
        gaussian::PrimitiveGaussian,
    },
    library::Library,
    optimization::{
        errors::OptResult,
        type_optimizer::{Grad, Score, TypeLikelihood},
    },
    utils::{normalize_log_probs, normalize_weights},
};
use nalgebra::DVector;
use ndarray::{Array1, Array3, Axis, s};
use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
};
use rand_distr::StandardNormal;
use statrs::distribution::{Continuous, Gamma};

/// Generative distribution over character types.
#[derive(Debug, Clone)]
pub struct CharacterTypeDist<'a> {
    lib: &'a Library,
    ncpt: usize,
    shape_priors: Vec<PrimitiveGaussian>,
    scale_priors: Vec<ScalePrior>,
    kappa: Categorical,
    nsub: Vec<Categorical>,
    start: Categorical,
    trans: Vec<Categorical>,
    rel: Categorical,
}

impl<'a> CharacterTypeDist<'a> {
    /// Precompute the priors of `lib`.
    ///
    /// # Errors
    /// - [`TypeError::NotPositiveDefinite`] for a shape covariance without a
    ///   Cholesky factor (informative libraries only).
    /// - [`TypeError::InvalidGammaParams`] for a non-positive scale prior.
    /// - [`TypeError::DegenerateCategorical`] for a categorical prior with no
    ///   usable mass.
    /// - [`TypeError::StructureMismatch`] if `pmat_nsub` has fewer rows than
    ///   `pkappa` has entries.
    pub fn new(lib: &'a Library) -> TypeResult<Self> {
        let n = lib.n();
        let shape = lib.shape();
        let shape_priors = if lib.isunif() {
            Vec::new()
        } else {
            (0..n)
                .map(|i| {
                    PrimitiveGaussian::new(i, shape.mu.row(i), shape.sigma.index_axis(Axis(0), i))
                })
                .collect::<TypeResult<Vec<_>>>()?
        };
        let scale_priors = lib
            .scale()
            .theta
            .outer_iter()
            .enumerate()
            .map(|(i, row)| ScalePrior::new(i, row[0], row[1]))
            .collect::<TypeResult<Vec<_>>>()?;

        let kappa = Categorical::from_weights(lib.pkappa().view(), "pkappa")?;
        let nsub = lib
            .pmat_nsub()
            .outer_iter()
            .map(|row| Categorical::from_weights(row, "pmat_nsub"))
            .collect::<TypeResult<Vec<_>>>()?;
        if nsub.len() < kappa.len() {
            return Err(TypeError::StructureMismatch {
                reason: "pmat_nsub needs a row for every stroke count in pkappa",
            });
        }
        let start = Categorical::new(normalize_log_probs(lib.log_start().view()), "logStart")?;
        let trans = (0..n)
            .map(|s| Categorical::new(lib.p_t(s)?, "logT"))
            .collect::<TypeResult<Vec<_>>>()?;
        let rel = Categorical::from_weights(lib.rel().mixprob.view(), "rel/mixprob")?;

        tracing::debug!(
            n,
            ncpt = lib.ncpt(),
            max_strokes = kappa.len(),
            isunif = lib.isunif(),
            "built character type distribution"
        );
        Ok(Self {
            lib,
            ncpt: lib.ncpt(),
            shape_priors,
            scale_priors,
            kappa,
            nsub,
            start,
            trans,
            rel,
        })
    }

    pub fn lib(&self) -> &'a Library {
        self.lib
    }

    /// Largest stroke count with prior mass support.
    pub fn max_strokes(&self) -> usize {
        self.kappa.len()
    }

    // ---- Sampling ----

    /// Sample a character type with `k` strokes, or a prior draw of `k` when
    /// `None`.
    ///
    /// # Errors
    /// - [`TypeError::InvalidStrokeCount`] if `k` is outside
    ///   `1..=max_strokes()`.
    pub fn sample_type<R: Rng + ?Sized>(
        &self, k: Option<usize>, rng: &mut R,
    ) -> TypeResult<Character> {
        let k = match k {
            Some(k) => {
                self.check_stroke_count(k)?;
                k
            }
            None => self.kappa.sample(rng) + 1,
        };
        let nsub_prior = &self.nsub[k - 1];
        let mut strokes: Vec<StrokeType> = Vec::with_capacity(k);
        for i in 0..k {
            let nsub = nsub_prior.sample(rng) + 1;
            let ids = self.sample_ids(nsub, rng);
            let mut shapes = Array3::zeros((nsub, self.ncpt, 2));
            for (j, &id) in ids.iter().enumerate() {
                let drawn = self.sample_shape(id, rng);
                for (dst, v) in shapes.slice_mut(s![j, .., ..]).iter_mut().zip(drawn.iter()) {
                    *dst = *v;
                }
            }
            let invscales: Array1<f64> =
                ids.iter().map(|&id| self.scale_priors[id].sampler.sample(rng)).collect();
            let relation = self.sample_relation(i, &strokes, rng);
            strokes.push(StrokeType { ids, shapes, invscales, relation });
        }
        Character::new(self.ncpt, strokes)
    }

    fn sample_ids<R: Rng + ?Sized>(&self, nsub: usize, rng: &mut R) -> Vec<usize> {
        let mut ids = Vec::with_capacity(nsub);
        let mut prev = self.start.sample(rng);
        ids.push(prev);
        for _ in 1..nsub {
            prev = self.trans[prev].sample(rng);
            ids.push(prev);
        }
        ids
    }

    fn sample_shape<R: Rng + ?Sized>(&self, id: usize, rng: &mut R) -> DVector<f64> {
        match self.shape_priors.get(id) {
            Some(prior) => prior.sample(rng),
            None => DVector::from_fn(2 * self.ncpt, |_, _| rng.sample::<f64, _>(StandardNormal)),
        }
    }

    fn sample_relation<R: Rng + ?Sized>(
        &self, i: usize, previous: &[StrokeType], rng: &mut R,
    ) -> Relation {
        let spatial = self.lib.spatial();
        if i == 0 {
            return Relation::Independent { gpos: spatial.sample_point(0, rng) };
        }
        match self.rel.sample(rng) {
            0 => Relation::Independent { gpos: spatial.sample_point(i, rng) },
            1 => Relation::Start { attach_spot: rng.random_range(0..i) },
            2 => Relation::End { attach_spot: rng.random_range(0..i) },
            _ => {
                let attach_spot = rng.random_range(0..i);
                Relation::Mid {
                    attach_spot,
                    subid_spot: rng.random_range(0..previous[attach_spot].nsub()),
                    eval_spot: rng.random_range(0.0..self.ncpt as f64),
                }
            }
        }
    }

    // ---- Scoring ----

    /// Log-probability of `c` under the prior.
    ///
    /// # Errors
    /// - [`TypeError::StructureMismatch`] if `c` is malformed or its `ncpt`
    ///   differs from the library's.
    /// - [`TypeError::InvalidStrokeCount`] / [`TypeError::InvalidSubstrokeCount`]
    ///   for counts outside the prior's support.
    /// - [`TypeError::InvalidPrimitive`] for an id `≥ N`.
    pub fn score_type(&self, c: &Character) -> TypeResult<f64> {
        self.check_character(c)?;
        let k = c.k();
        let nsub_prior = &self.nsub[k - 1];
        let mut total = self.kappa.ln_prob(k - 1);
        for (i, stroke) in c.strokes.iter().enumerate() {
            total += nsub_prior.ln_prob(stroke.nsub() - 1);
            total += self.start.ln_prob(stroke.ids[0]);
            for pair in stroke.ids.windows(2) {
                total += self.trans[pair[0]].ln_prob(pair[1]);
            }
            for (j, &id) in stroke.ids.iter().enumerate() {
                if let Some(prior) = self.shape_priors.get(id) {
                    total += prior.ln_pdf(&self.flat_shape(stroke, j));
                }
                total += self.scale_priors[id].ln_pdf(stroke.invscales[j]);
            }
            total += self.score_relation(i, stroke, c);
        }
        Ok(total)
    }

    fn score_relation(&self, i: usize, stroke: &StrokeType, c: &Character) -> f64 {
        let spatial = self.lib.spatial();
        if i == 0 {
            return match stroke.relation {
                Relation::Independent { gpos } => spatial.score_point(0, gpos),
                _ => f64::NEG_INFINITY,
            };
        }
        let uniform_attach = -(i as f64).ln();
        let kind = self.rel.ln_prob(stroke.relation.category());
        kind + match stroke.relation {
            Relation::Independent { gpos } => spatial.score_point(i, gpos),
            Relation::Start { .. } | Relation::End { .. } => uniform_attach,
            Relation::Mid { attach_spot, eval_spot, .. } => {
                let ncpt = self.ncpt as f64;
                let spot = if (0.0..=ncpt).contains(&eval_spot) {
                    -ncpt.ln()
                } else {
                    f64::NEG_INFINITY
                };
                uniform_attach - (c.strokes[attach_spot].nsub() as f64).ln() + spot
            }
        }
    }

    /// Gradient of [`score_type`](Self::score_type) with respect to the
    /// character's continuous parameters, in layout order: per stroke the
    /// shapes, the inverse scales, and the evaluation spot of a mid-stroke
    /// relation.
    ///
    /// The evaluation spot has a flat prior, so its entry is zero.
    ///
    /// # Errors
    /// Same as [`score_type`](Self::score_type).
    pub fn score_type_grad(&self, c: &Character) -> TypeResult<Grad> {
        self.check_character(c)?;
        let mut grad = Vec::new();
        for stroke in &c.strokes {
            for (j, &id) in stroke.ids.iter().enumerate() {
                match self.shape_priors.get(id) {
                    Some(prior) => {
                        grad.extend(prior.grad_ln_pdf(&self.flat_shape(stroke, j)).iter())
                    }
                    None => grad.extend(std::iter::repeat_n(0.0, 2 * self.ncpt)),
                }
            }
            for (&id, &x) in stroke.ids.iter().zip(stroke.invscales.iter()) {
                grad.push(self.scale_priors[id].grad_ln_pdf(x));
            }
            if let Relation::Mid { .. } = stroke.relation {
                grad.push(0.0);
            }
        }
        Ok(Grad::from(grad))
    }

    // ---- Helper methods ----

    fn check_stroke_count(&self, k: usize) -> TypeResult<()> {
        if k == 0 || k > self.kappa.len() {
            return Err(TypeError::InvalidStrokeCount { k, max: self.kappa.len() });
        }
        Ok(())
    }

    fn check_character(&self, c: &Character) -> TypeResult<()> {
        c.check_structure()?;
        if c.ncpt != self.ncpt {
            return Err(TypeError::StructureMismatch {
                reason: "character ncpt differs from the library",
            });
        }
        self.check_stroke_count(c.k())?;
        let max_nsub = self.nsub[c.k() - 1].len();
        let n = self.lib.n();
        for stroke in &c.strokes {
            if stroke.nsub() > max_nsub {
                return Err(TypeError::InvalidSubstrokeCount { nsub: stroke.nsub(), max: max_nsub });
            }
            if let Some(&id) = stroke.ids.iter().find(|&&id| id >= n) {
                return Err(TypeError::InvalidPrimitive { id, n });
            }
        }
        Ok(())
    }

    fn flat_shape(&self, stroke: &StrokeType, j: usize) -> DVector<f64> {
        DVector::from_iterator(2 * self.ncpt, stroke.shapes.slice(s![j, .., ..]).iter().copied())
    }
}

impl TypeLikelihood for CharacterTypeDist<'_> {
    type Type = Character;

    fn score(&self, c: &Character) -> OptResult<Score> {
        Ok(self.score_type(c)?)
    }

    fn score_grad(&self, c: &Character) -> OptResult<Grad> {
        Ok(self.score_type_grad(c)?)
    }
}

// ---- Prior components ----

/// Normalized categorical prior with a cached sampler.
#[derive(Debug, Clone)]
struct Categorical {
    probs: Array1<f64>,
    sampler: WeightedIndex<f64>,
}

impl Categorical {
    fn new(probs: Array1<f64>, field: &'static str) -> TypeResult<Self> {
        let sampler = WeightedIndex::new(probs.iter())
            .map_err(|_| TypeError::DegenerateCategorical { field })?;
        Ok(Self { probs, sampler })
    }

    fn from_weights(weights: ndarray::ArrayView1<'_, f64>, field: &'static str) -> TypeResult<Self> {
        let probs = normalize_weights(weights).ok_or(TypeError::DegenerateCategorical { field })?;
        Self::new(probs, field)
    }

    fn len(&self) -> usize {
        self.probs.len()
    }

    fn ln_prob(&self, i: usize) -> f64 {
        self.probs.get(i).map_or(f64::NEG_INFINITY, |p| p.ln())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.sampler.sample(rng)
    }
}

/// Gamma prior on an inverse scale, parameterized by shape and scale.
#[derive(Debug, Clone)]
struct ScalePrior {
    shape: f64,
    scale: f64,
    density: Gamma,
    sampler: rand_distr::Gamma<f64>,
}

impl ScalePrior {
    fn new(primitive: usize, shape: f64, scale: f64) -> TypeResult<Self> {
        let invalid = || TypeError::InvalidGammaParams { primitive, shape, scale };
        if !(shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0) {
            return Err(invalid());
        }
        let density = Gamma::new(shape, 1.0 / scale).map_err(|_| invalid())?;
        let sampler = rand_distr::Gamma::new(shape, scale).map_err(|_| invalid())?;
        Ok(Self { shape, scale, density, sampler })
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if x > 0.0 { self.density.ln_pdf(x) } else { f64::NEG_INFINITY }
    }

    fn grad_ln_pdf(&self, x: f64) -> f64 {
        (self.shape - 1.0) / x - 1.0 / self.scale
    }
}
