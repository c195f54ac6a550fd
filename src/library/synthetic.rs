//! library::synthetic — writer for small, well-posed parameter sources.
//!
//! Purpose
//! -------
//! Produce a complete parameter source directory (every group, single file,
//! and spatial histogram) with a handful of primitives, so the loader,
//! type distribution, and optimizer can be exercised without the full
//! trained library.
//!
//! Key behaviors
//! -------------
//! - Shape means and covariances are generated in native order and written
//!   through the inverse reindex, exactly as a real source stores them.
//! - Vectors are written as `1 × n` rows and squeezed back on load.
//! - With `uniform = true` every shape mean is written as undefined (`null`),
//!   giving a non-informative library.
//!
//! Invariants & assumptions
//! ------------------------
//! - The generated source satisfies every check in `library::validation`:
//!   uniform start distribution, strictly positive transition rows, and
//!   block-diagonal positive-definite covariances.
use crate::library::{
    errors::LibResult,
    library::{HIST_FIELDS, SPATIAL_DIR},
    reindex::{mu_to_storage, sigma_to_storage},
    source::{param_path, write_array},
};
use ndarray::{Array1, Array2, Array3, ArrayD, IxDyn, array};
use std::path::Path;

/// Dimensions of a synthetic parameter source.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticLibrary {
    /// Number of primitives `N`.
    pub n_primitives: usize,
    /// Control points per sub-stroke.
    pub ncpt: usize,
    /// Number of spatial histograms.
    pub n_relations: usize,
    /// Length of `pkappa` (largest stroke count).
    pub max_strokes: usize,
    /// Width of `pmat_nsub` (largest sub-stroke count).
    pub max_substrokes: usize,
    /// Write undefined shape means.
    pub uniform: bool,
}

impl Default for SyntheticLibrary {
    fn default() -> Self {
        Self {
            n_primitives: 4,
            ncpt: 5,
            n_relations: 3,
            max_strokes: 3,
            max_substrokes: 3,
            uniform: false,
        }
    }
}

/// Grid resolution of each synthetic spatial histogram.
const HIST_BINS: usize = 8;

impl SyntheticLibrary {
    /// Write the full source under `dir`.
    ///
    /// # Errors
    /// - [`LibError::Io`](crate::library::errors::LibError::Io) if any file
    ///   cannot be written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> LibResult<()> {
        let dir = dir.as_ref();
        let n = self.n_primitives;
        let uniform_n = Array1::from_elem(n, 1.0 / n as f64);

        // ---- Groups ----
        let shape = dir.join("shape");
        write(&shape, "mu", mu_to_storage(&self.native_mu()).into_dyn())?;
        write(&shape, "Sigma", sigma_to_storage(&self.native_sigma()).into_dyn())?;
        write(&shape, "mixprob", row(&uniform_n))?;
        write(&shape, "freq", row(&uniform_n))?;
        write(&shape, "vsd", row(&Array1::from_elem(n, 0.5)))?;

        let theta = Array2::from_shape_fn((n, 2), |(_, j)| if j == 0 { 5.0 } else { 0.2 });
        write(&dir.join("scale"), "theta", theta.into_dyn())?;

        let rel = dir.join("rel");
        write(&rel, "mixprob", row(&array![0.4, 0.2, 0.2, 0.2]))?;
        write(&rel, "sigma_x", scalar(0.1))?;
        write(&rel, "sigma_y", scalar(0.1))?;

        write(&dir.join("tokenvar"), "sigma_shape", scalar(0.25))?;
        write(&dir.join("affine"), "mu_scale", row(&array![1.0, 1.0]))?;
        write(&dir.join("stat"), "n_train", scalar(20.0))?;

        // ---- Singles ----
        let log_t = Array2::from_shape_fn((n, n), |(i, j)| (1 + i + j) as f64);
        let log_t = Array2::from_shape_fn((n, n), |(i, j)| (log_t[[i, j]] / log_t.row(i).sum()).ln());
        write(dir, "logT", log_t.into_dyn())?;
        write(dir, "logStart", row(&uniform_n.mapv(f64::ln)))?;
        write(dir, "pkappa", row(&harmonic(self.max_strokes)))?;
        let nsub_probs = harmonic(self.max_substrokes);
        let pmat =
            Array2::from_shape_fn((self.max_strokes, self.max_substrokes), |(_, j)| nsub_probs[j]);
        write(dir, "pmat_nsub", pmat.into_dyn())?;
        write(dir, "newscale", row(&Array1::ones(n)))?;
        write(dir, "smooth_bigrams", scalar(0.0))?;
        write(dir, "diagSigma", Array2::<f64>::eye(2 * self.ncpt).into_dyn())?;

        // ---- Spatial ----
        for r in 0..self.n_relations {
            let hist = dir.join(SPATIAL_DIR).join(format!("SH_{r:02}"));
            let mass = Array2::from_shape_fn((HIST_BINS, HIST_BINS), |(y, x)| {
                1.0 + ((x + y + r) % 3) as f64
            });
            let total = mass.sum();
            let edges = Array1::linspace(-1.0, 1.0, HIST_BINS + 1);
            let width = 2.0 / HIST_BINS as f64;
            let values = [
                mass.mapv(|m| (m / total).ln()).into_dyn(),
                row(&edges),
                row(&edges),
                row(&array![width, width]),
                scalar(1.0),
            ];
            for (name, value) in HIST_FIELDS.iter().zip(values) {
                write(&hist, name, value)?;
            }
        }
        tracing::debug!(dir = %dir.display(), n, ncpt = self.ncpt, "wrote synthetic library");
        Ok(())
    }

    /// Native-order shape means, `N × 2·ncpt`.
    pub fn native_mu(&self) -> Array2<f64> {
        let half = (self.ncpt as f64 - 1.0) / 2.0;
        Array2::from_shape_fn((self.n_primitives, 2 * self.ncpt), |(n, j)| {
            if self.uniform {
                return f64::NAN;
            }
            let (c, d) = ((j / 2) as f64, j % 2);
            let sign = if d == 0 { 1.0 } else { -1.0 };
            sign * 0.5 * (c - half) + 0.1 * n as f64
        })
    }

    /// Native-order covariances, `N × 2·ncpt × 2·ncpt`: `0.3·I` with `0.05`
    /// coupling the x and y of each control point.
    pub fn native_sigma(&self) -> Array3<f64> {
        let w = 2 * self.ncpt;
        Array3::from_shape_fn((self.n_primitives, w, w), |(_, a, b)| {
            if a == b {
                0.3
            } else if a / 2 == b / 2 {
                0.05
            } else {
                0.0
            }
        })
    }
}

// ---- Helper methods ----

fn write(dir: &Path, name: &str, value: ArrayD<f64>) -> LibResult<()> {
    write_array(&param_path(dir, name), value.view())
}

fn row(v: &Array1<f64>) -> ArrayD<f64> {
    v.clone().insert_axis(ndarray::Axis(0)).into_dyn()
}

fn scalar(v: f64) -> ArrayD<f64> {
    ArrayD::from_elem(IxDyn(&[1, 1]), v)
}

/// `p_k ∝ 1 / k` for `k = 1..=len`.
fn harmonic(len: usize) -> Array1<f64> {
    let w = Array1::from_shape_fn(len, |k| 1.0 / (k + 1) as f64);
    let total = w.sum();
    w / total
}
