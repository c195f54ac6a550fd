//! library::params — fixed schemas for the parameter groups.
//!
//! Purpose
//! -------
//! Turn the loosely typed field maps read from each group directory into
//! structs with named, rank-checked fields. Fields the model consumes are
//! promoted to typed members; every other field of a group is preserved
//! verbatim in an [`ParamGroup`] so nothing read from disk is dropped.
//!
//! Key behaviors
//! -------------
//! - [`ShapeParams::from_fields`] coerces `mu`/`Sigma` to rank 2/3, checks the
//!   control-point width, and applies the storage → native reindex.
//! - [`ScaleParams`] / [`RelParams`] expose `theta` and `mixprob`.
//! - [`ParamGroup`] is the schema for `tokenvar`, `affine`, and `stat`, whose
//!   fields are carried but not interpreted here.
//!
//! Invariants & assumptions
//! ------------------------
//! - Squeezing drops the primitive axis when the library holds a single
//!   primitive; it is restored here so ranks are stable for every `N ≥ 1`.
//! - Cross-field dimension agreement (everything sized `N`) is checked later
//!   by `library::validation`, after every group is loaded.
use crate::library::{
    errors::{LibError, LibResult},
    reindex::{mu_to_native, sigma_to_native},
    source::{into_rank1, into_rank2, into_rank3},
};
use ndarray::{Array1, Array2, Array3, ArrayD, Axis};
use std::collections::BTreeMap;

/// Untyped named fields of a parameter group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamGroup {
    fields: BTreeMap<String, ArrayD<f64>>,
}

impl ParamGroup {
    pub fn new(fields: BTreeMap<String, ArrayD<f64>>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Shape prior: per-primitive control-point Gaussians and usage statistics.
///
/// `mu` is `N × 2·ncpt` and `sigma` is `N × 2·ncpt × 2·ncpt`, both in native
/// (point-major) order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeParams {
    pub mu: Array2<f64>,
    pub sigma: Array3<f64>,
    pub mixprob: Array1<f64>,
    pub freq: Array1<f64>,
    pub vsd: Array1<f64>,
    pub extra: ParamGroup,
}

impl ShapeParams {
    /// Build the `shape` group from its raw fields.
    ///
    /// # Errors
    /// - [`LibError::MissingParameter`] for an absent required field.
    /// - [`LibError::RankMismatch`] for a field with the wrong rank.
    /// - [`LibError::OddControlWidth`] if `mu` has an odd or zero width.
    /// - [`LibError::ShapeMismatch`] if `Sigma` does not match `mu`.
    pub fn from_fields(mut fields: BTreeMap<String, ArrayD<f64>>) -> LibResult<Self> {
        let mu = take(&mut fields, "shape", "mu")?;
        let mu = into_rank2("shape/mu", restore_axis(mu, 2, 0))?;
        let (n, width) = mu.dim();
        if width == 0 || width % 2 != 0 {
            return Err(LibError::OddControlWidth { width });
        }

        let sigma = take(&mut fields, "shape", "Sigma")?;
        let sigma = into_rank3("shape/Sigma", restore_axis(sigma, 3, 2))?;
        let (rows, cols, depth) = sigma.dim();
        for (found, expected) in [(rows, width), (cols, width), (depth, n)] {
            if found != expected {
                return Err(LibError::ShapeMismatch {
                    field: "shape/Sigma".to_string(),
                    expected,
                    found,
                });
            }
        }

        let mixprob = into_rank1("shape/mixprob", take(&mut fields, "shape", "mixprob")?)?;
        let freq = into_rank1("shape/freq", take(&mut fields, "shape", "freq")?)?;
        let vsd = into_rank1("shape/vsd", take(&mut fields, "shape", "vsd")?)?;

        Ok(Self {
            mu: mu_to_native(&mu),
            sigma: sigma_to_native(&sigma),
            mixprob,
            freq,
            vsd,
            extra: ParamGroup::new(fields),
        })
    }

    /// Number of control points per sub-stroke.
    pub fn ncpt(&self) -> usize {
        self.mu.ncols() / 2
    }
}

/// Scale prior: `theta[n] = (gamma shape, gamma scale)` of the inverse scale
/// of primitive `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleParams {
    pub theta: Array2<f64>,
    pub extra: ParamGroup,
}

impl ScaleParams {
    pub fn from_fields(mut fields: BTreeMap<String, ArrayD<f64>>) -> LibResult<Self> {
        let theta = take(&mut fields, "scale", "theta")?;
        let theta = into_rank2("scale/theta", restore_axis(theta, 2, 0))?;
        if theta.ncols() != 2 {
            return Err(LibError::ShapeMismatch {
                field: "scale/theta".to_string(),
                expected: 2,
                found: theta.ncols(),
            });
        }
        Ok(Self { theta, extra: ParamGroup::new(fields) })
    }
}

/// Relation prior: `mixprob` over the relation categories, ordered
/// independent, start, end, mid.
#[derive(Debug, Clone, PartialEq)]
pub struct RelParams {
    pub mixprob: Array1<f64>,
    pub extra: ParamGroup,
}

impl RelParams {
    /// Number of relation categories.
    pub const N_TYPES: usize = 4;

    pub fn from_fields(mut fields: BTreeMap<String, ArrayD<f64>>) -> LibResult<Self> {
        let mixprob = into_rank1("rel/mixprob", take(&mut fields, "rel", "mixprob")?)?;
        if mixprob.len() != Self::N_TYPES {
            return Err(LibError::ShapeMismatch {
                field: "rel/mixprob".to_string(),
                expected: Self::N_TYPES,
                found: mixprob.len(),
            });
        }
        Ok(Self { mixprob, extra: ParamGroup::new(fields) })
    }
}

// ---- Helper methods ----

fn take(
    fields: &mut BTreeMap<String, ArrayD<f64>>, group: &str, name: &str,
) -> LibResult<ArrayD<f64>> {
    fields.remove(name).ok_or_else(|| LibError::MissingParameter { name: format!("{group}/{name}") })
}

/// Re-insert an axis lost to squeezing when `array` is exactly one rank
/// short of `rank`.
pub(crate) fn restore_axis(array: ArrayD<f64>, rank: usize, axis: usize) -> ArrayD<f64> {
    if array.ndim() + 1 == rank { array.insert_axis(Axis(axis)) } else { array }
}
