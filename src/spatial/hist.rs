//! spatial::hist — 2-D binned log-density over the drawing plane.
//!
//! Purpose
//! -------
//! Represent one empirical distribution of stroke start positions as a grid
//! of log-probability masses, and provide scoring, sampling, and fitting.
//!
//! Key behaviors
//! -------------
//! - [`SpatialHist::new`] validates the grid against its bin edges.
//! - [`SpatialHist::score`] looks up the bin containing a point and returns
//!   the log *density* `logpYX[y, x] − ln(rg_x · rg_y)`; points outside the
//!   edges score `-∞`.
//! - [`SpatialHist::sample`] draws a bin with probability ∝ `exp(logpYX)`
//!   and a point uniformly inside it.
//! - [`SpatialHist::fit`] estimates a grid from points with additive
//!   `prior_count` smoothing.
//!
//! Conventions
//! -----------
//! - Points are `[x, y]`. The grid is indexed `[y_bin, x_bin]`.
//! - Bins are half-open `[lo, hi)` except the last bin on each axis, which
//!   also contains its upper edge.
//! - `prior_count` is carried unchanged from the source; only `fit` uses it.
use crate::library::errors::{LibError, LibResult};
use ndarray::{Array1, Array2};
use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
};

/// Smoothed 2-D histogram over the drawing plane.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialHist {
    log_pyx: Array2<f64>,
    xlab: Array1<f64>,
    ylab: Array1<f64>,
    rg_bin: [f64; 2],
    prior_count: f64,
    sampler: WeightedIndex<f64>,
}

impl SpatialHist {
    /// Build a histogram from a log-mass grid and its bin metadata.
    ///
    /// # Errors
    /// - [`LibError::InvalidHistogram`] if the edges do not bracket the grid,
    ///   are not increasing, the bin widths are not positive, `prior_count` is
    ///   negative, or no bin has finite mass.
    pub fn new(
        log_pyx: Array2<f64>, xlab: Array1<f64>, ylab: Array1<f64>, rg_bin: [f64; 2],
        prior_count: f64,
    ) -> LibResult<Self> {
        let (ny, nx) = log_pyx.dim();
        if nx == 0 || ny == 0 {
            return Err(LibError::InvalidHistogram { reason: "grid must have at least one bin" });
        }
        if xlab.len() != nx + 1 || ylab.len() != ny + 1 {
            return Err(LibError::InvalidHistogram {
                reason: "bin edges must have one more entry than bins",
            });
        }
        if !is_increasing(&xlab) || !is_increasing(&ylab) {
            return Err(LibError::InvalidHistogram {
                reason: "bin edges must be finite and strictly increasing",
            });
        }
        if rg_bin.iter().any(|w| !(w.is_finite() && *w > 0.0)) {
            return Err(LibError::InvalidHistogram {
                reason: "bin widths must be finite and positive",
            });
        }
        if !(prior_count.is_finite() && prior_count >= 0.0) {
            return Err(LibError::InvalidHistogram {
                reason: "prior count must be finite and non-negative",
            });
        }
        let max = log_pyx.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(LibError::InvalidHistogram { reason: "no bin carries finite mass" });
        }
        let sampler = WeightedIndex::new(log_pyx.iter().map(|&v| {
            let w = (v - max).exp();
            if w.is_nan() { 0.0 } else { w }
        }))
        .map_err(|_| LibError::InvalidHistogram { reason: "bin masses cannot be sampled" })?;
        Ok(Self { log_pyx, xlab, ylab, rg_bin, prior_count, sampler })
    }

    /// Estimate a histogram from `points` on the box `xlim × ylim` with
    /// `nbins` bins per side.
    ///
    /// Each bin count is increased by `prior_count` before normalizing.
    /// Points outside the box are ignored.
    ///
    /// # Errors
    /// - [`LibError::InvalidHistogram`] if `nbins == 0`, a limit is empty or
    ///   non-finite, or the smoothed counts are all zero.
    pub fn fit(
        points: &[[f64; 2]], xlim: [f64; 2], ylim: [f64; 2], nbins: usize, prior_count: f64,
    ) -> LibResult<Self> {
        if nbins == 0 {
            return Err(LibError::InvalidHistogram { reason: "need at least one bin per side" });
        }
        let valid = |lim: [f64; 2]| lim[0].is_finite() && lim[1].is_finite() && lim[0] < lim[1];
        if !valid(xlim) || !valid(ylim) {
            return Err(LibError::InvalidHistogram { reason: "limits must be finite and ordered" });
        }
        let xlab = Array1::linspace(xlim[0], xlim[1], nbins + 1);
        let ylab = Array1::linspace(ylim[0], ylim[1], nbins + 1);
        let rg_bin = [(xlim[1] - xlim[0]) / nbins as f64, (ylim[1] - ylim[0]) / nbins as f64];

        let mut counts = Array2::from_elem((nbins, nbins), prior_count);
        for p in points {
            if let (Some(xi), Some(yi)) = (bin_index(&xlab, p[0]), bin_index(&ylab, p[1])) {
                counts[[yi, xi]] += 1.0;
            }
        }
        let total = counts.sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(LibError::InvalidHistogram { reason: "histogram has no mass" });
        }
        let log_pyx = counts.mapv(|c| (c / total).ln());
        Self::new(log_pyx, xlab, ylab, rg_bin, prior_count)
    }

    /// Log density of `point`; `-∞` outside the grid.
    pub fn score(&self, point: [f64; 2]) -> f64 {
        match (bin_index(&self.xlab, point[0]), bin_index(&self.ylab, point[1])) {
            (Some(xi), Some(yi)) => self.log_pyx[[yi, xi]] - self.log_bin_area(),
            _ => f64::NEG_INFINITY,
        }
    }

    /// Draw a point: a bin ∝ `exp(logpYX)`, then uniform within the bin.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> [f64; 2] {
        let nx = self.log_pyx.ncols();
        let flat = self.sampler.sample(rng);
        let (yi, xi) = (flat / nx, flat % nx);
        let x = self.xlab[xi] + rng.random::<f64>() * (self.xlab[xi + 1] - self.xlab[xi]);
        let y = self.ylab[yi] + rng.random::<f64>() * (self.ylab[yi + 1] - self.ylab[yi]);
        [x, y]
    }

    pub fn log_pyx(&self) -> &Array2<f64> {
        &self.log_pyx
    }

    pub fn xlab(&self) -> &Array1<f64> {
        &self.xlab
    }

    pub fn ylab(&self) -> &Array1<f64> {
        &self.ylab
    }

    pub fn rg_bin(&self) -> [f64; 2] {
        self.rg_bin
    }

    pub fn prior_count(&self) -> f64 {
        self.prior_count
    }

    fn log_bin_area(&self) -> f64 {
        (self.rg_bin[0] * self.rg_bin[1]).ln()
    }
}

// ---- Helper methods ----

fn is_increasing(edges: &Array1<f64>) -> bool {
    edges.iter().all(|e| e.is_finite()) && edges.windows(2).into_iter().all(|w| w[0] < w[1])
}

/// Bin of `v` along an axis with the given edges, or `None` outside them.
fn bin_index(edges: &Array1<f64>, v: f64) -> Option<usize> {
    let n_bins = edges.len().checked_sub(1)?;
    if n_bins == 0 || !(v >= edges[0] && v <= edges[n_bins]) {
        return None;
    }
    let above = edges.iter().take_while(|&&e| e <= v).count();
    Some((above - 1).min(n_bins - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    fn two_by_two() -> SpatialHist {
        // Mass 0.1 0.2 / 0.3 0.4 on [0, 2] × [0, 2].
        let log_pyx = array![[0.1f64.ln(), 0.2f64.ln()], [0.3f64.ln(), 0.4f64.ln()]];
        SpatialHist::new(log_pyx, array![0.0, 1.0, 2.0], array![0.0, 1.0, 2.0], [1.0, 1.0], 1.0)
            .expect("valid histogram")
    }

    #[test]
    // Purpose
    // -------
    // Verify nearest-bin scoring and the `-∞` outside the support.
    //
    // Given
    // -----
    // - A 2×2 unit-bin histogram.
    //
    // Expect
    // ------
    // - Point (1.5, 0.5) scores ln 0.2, the upper corner maps to the last
    //   bin, and any point outside the edges scores `-∞`.
    fn score_uses_containing_bin() {
        // Arrange
        let h = two_by_two();

        // Act
        let inside = h.score([1.5, 0.5]);
        let corner = h.score([2.0, 2.0]);
        let outside = h.score([-0.1, 0.5]);

        // Assert
        assert_relative_eq!(inside, 0.2f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(corner, 0.4f64.ln(), epsilon = 1e-12);
        assert_eq!(outside, f64::NEG_INFINITY);
        assert_eq!(h.score([0.5, f64::NAN]), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Bin area enters the density: halving both widths adds ln 4.
    fn score_is_a_density() {
        let log_pyx = array![[0.0]];
        let h = SpatialHist::new(log_pyx, array![0.0, 0.5], array![0.0, 0.5], [0.5, 0.5], 0.0)
            .unwrap();

        assert_relative_eq!(h.score([0.25, 0.25]), 4f64.ln(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Samples land inside the support and follow the bin masses.
    //
    // Given
    // -----
    // - The 2×2 histogram and 20k seeded draws.
    //
    // Expect
    // ------
    // - Every sample scores finite; the top-right bin frequency is ≈ 0.4.
    fn sample_follows_bin_mass() {
        // Arrange
        let h = two_by_two();
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;

        // Act
        let samples: Vec<[f64; 2]> = (0..n).map(|_| h.sample(&mut rng)).collect();

        // Assert
        assert!(samples.iter().all(|&p| h.score(p).is_finite()));
        let top_right = samples.iter().filter(|p| p[0] >= 1.0 && p[1] >= 1.0).count();
        assert_relative_eq!(top_right as f64 / n as f64, 0.4, epsilon = 0.02);
    }

    #[test]
    // Purpose
    // -------
    // Fitting applies additive smoothing and yields a normalized grid.
    //
    // Given
    // -----
    // - Three points in the lower-left bin of a 2×2 grid, prior count 1.
    //
    // Expect
    // ------
    // - Masses (3+1)/7 and 1/7, summing to one; `prior_count` preserved.
    fn fit_smooths_counts() {
        let points = [[0.1, 0.1], [0.2, 0.3], [0.4, 0.4], [5.0, 5.0]];

        let h = SpatialHist::fit(&points, [0.0, 1.0], [0.0, 1.0], 2, 1.0).expect("fit succeeds");

        let mass = h.log_pyx().mapv(f64::exp);
        assert_relative_eq!(mass.sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(mass[[0, 0]], 4.0 / 7.0, epsilon = 1e-12);
        assert_relative_eq!(mass[[1, 1]], 1.0 / 7.0, epsilon = 1e-12);
        assert_eq!(h.prior_count(), 1.0);
        assert_eq!(h.rg_bin(), [0.5, 0.5]);
    }

    #[test]
    // Purpose
    // -------
    // Inconsistent metadata is rejected at construction.
    fn new_rejects_inconsistent_metadata() {
        let grid = array![[0.0, 0.0]];

        let short_edges =
            SpatialHist::new(grid.clone(), array![0.0, 1.0], array![0.0, 1.0], [1.0, 1.0], 0.0);
        let bad_width =
            SpatialHist::new(grid.clone(), array![0.0, 1.0, 2.0], array![0.0, 1.0], [0.0, 1.0], 0.0);
        let no_mass = SpatialHist::new(
            array![[f64::NEG_INFINITY]],
            array![0.0, 1.0],
            array![0.0, 1.0],
            [1.0, 1.0],
            0.0,
        );

        assert!(matches!(short_edges, Err(LibError::InvalidHistogram { .. })));
        assert!(matches!(bad_width, Err(LibError::InvalidHistogram { .. })));
        assert!(matches!(no_mass, Err(LibError::InvalidHistogram { .. })));
    }
}
