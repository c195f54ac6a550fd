//! library::library — the validated hyperparameter library.
//!
//! Purpose
//! -------
//! Assemble every parameter group, single-file parameter, and the spatial
//! model from a parameter source directory into one immutable [`Library`],
//! rejecting any source that violates the model's structural invariants.
//!
//! Key behaviors
//! -------------
//! - [`Library::load`] reads the six groups (`shape`, `scale`, `rel`,
//!   `tokenvar`, `affine`, `stat`), the seven single files (`logT`,
//!   `logStart`, `pkappa`, `pmat_nsub`, `newscale`, `smooth_bigrams`,
//!   `diagSigma`), and every sub-directory of `Spatial/` in name order.
//! - Shape means and covariances are reindexed to native order while the
//!   `shape` group is built (see `library::reindex`).
//! - [`Library::check_consistent`] runs all cross-field checks; `load`
//!   calls it and fails on the first violation, so a `Library` value is
//!   always consistent.
//! - [`Library::p_t`] returns the normalized transition distribution out of
//!   a primitive.
//!
//! Invariants & assumptions
//! ------------------------
//! - `shape.mu` is `N × 2·ncpt`; `shape.Sigma` is `N × 2·ncpt × 2·ncpt`.
//! - `shape.{mixprob, freq, vsd}`, `scale.theta` rows, `logT` rows/cols, and
//!   `logStart` all have length `N`.
//! - `Σ exp(logStart) = 1` and every normalized `exp(logT[s])` sums to one,
//!   both within `1e-6`.
//! - A library whose `shape.mu` contains `NaN` is non-informative
//!   ([`Library::isunif`]); consumers fall back to uninformed shape priors.
//!
//! Conventions
//! -----------
//! - **Primitive indices are 0-based** and typed `usize`.
//! - The library is read-only after construction; share it as `&Library`.
//!
//! Downstream usage
//! ----------------
//! - `ctd::CharacterTypeDist::new(&lib)` precomputes sampling/scoring tables.
//! - Tests build sources with `library::SyntheticLibrary`.
use crate::{
    library::{
        errors::{LibError, LibResult},
        params::{ParamGroup, RelParams, ScaleParams, ShapeParams, restore_axis},
        source::{self, into_rank1, into_rank2, load_group, load_single, param_path},
        validation::{check_log_start, check_primitive_count, check_transitions},
    },
    spatial::{SpatialHist, SpatialModel},
    utils::normalize_log_probs,
};
use ndarray::{Array1, Array2, ArrayD, Axis};
use std::path::Path;

/// Names of the group directories of a parameter source.
pub const GROUP_NAMES: [&str; 6] = ["shape", "scale", "rel", "tokenvar", "affine", "stat"];

/// Names of the single-file parameters of a parameter source.
pub const SINGLE_NAMES: [&str; 7] =
    ["logT", "logStart", "pkappa", "pmat_nsub", "newscale", "smooth_bigrams", "diagSigma"];

/// Directory holding one sub-directory per spatial histogram.
pub const SPATIAL_DIR: &str = "Spatial";

/// Field files of a spatial histogram directory.
pub const HIST_FIELDS: [&str; 5] = ["logpYX", "xlab", "ylab", "rg_bin", "prior_count"];

/// Hyperparameters of the generative model of character types.
#[derive(Debug, Clone, PartialEq)]
pub struct Library {
    shape: ShapeParams,
    scale: ScaleParams,
    rel: RelParams,
    tokenvar: ParamGroup,
    affine: ParamGroup,
    stat: ParamGroup,
    log_t: Array2<f64>,
    log_start: Array1<f64>,
    pkappa: Array1<f64>,
    pmat_nsub: Array2<f64>,
    newscale: ArrayD<f64>,
    smooth_bigrams: ArrayD<f64>,
    diag_sigma: ArrayD<bool>,
    spatial: SpatialModel,
}

impl Library {
    /// Load and validate a library from the parameter source at `dir`.
    ///
    /// # Errors
    /// - [`LibError::MissingParameter`] if any group, single, or histogram
    ///   field is absent.
    /// - [`LibError::Io`] / [`LibError::Parse`] for unreadable files.
    /// - [`LibError::RankMismatch`], [`LibError::ShapeMismatch`],
    ///   [`LibError::OddControlWidth`], [`LibError::NotNormalized`] for
    ///   violated invariants.
    /// - [`LibError::InvalidHistogram`] / [`LibError::EmptySpatialModel`] for
    ///   a malformed `Spatial/` directory.
    pub fn load(dir: impl AsRef<Path>) -> LibResult<Self> {
        let dir = dir.as_ref();
        tracing::debug!(dir = %dir.display(), "loading parameter library");

        let shape = ShapeParams::from_fields(load_group(dir, "shape")?)?;
        let scale = ScaleParams::from_fields(load_group(dir, "scale")?)?;
        let rel = RelParams::from_fields(load_group(dir, "rel")?)?;
        let tokenvar = ParamGroup::new(load_group(dir, "tokenvar")?);
        let affine = ParamGroup::new(load_group(dir, "affine")?);
        let stat = ParamGroup::new(load_group(dir, "stat")?);

        let log_t = into_rank2("logT", restore_square(load_single(dir, "logT")?))?;
        let log_start = into_rank1("logStart", load_single(dir, "logStart")?)?;
        let pkappa = into_rank1("pkappa", load_single(dir, "pkappa")?)?;
        let pmat_nsub =
            into_rank2("pmat_nsub", restore_rows(load_single(dir, "pmat_nsub")?, pkappa.len()))?;
        let newscale = load_single(dir, "newscale")?;
        let smooth_bigrams = load_single(dir, "smooth_bigrams")?;
        let diag_sigma = load_single(dir, "diagSigma")?.mapv(|v| v != 0.0);

        let spatial = load_spatial(&dir.join(SPATIAL_DIR))?;

        let lib = Self {
            shape,
            scale,
            rel,
            tokenvar,
            affine,
            stat,
            log_t,
            log_start,
            pkappa,
            pmat_nsub,
            newscale,
            smooth_bigrams,
            diag_sigma,
            spatial,
        };
        lib.check_consistent()?;
        tracing::info!(
            n = lib.n(),
            ncpt = lib.ncpt(),
            n_hists = lib.spatial.len(),
            isunif = lib.isunif(),
            "loaded parameter library"
        );
        Ok(lib)
    }

    /// Check every cross-field invariant of the library.
    ///
    /// # Errors
    /// Returns the first violation found, in the order: dimension agreement,
    /// start distribution, transition rows.
    pub fn check_consistent(&self) -> LibResult<()> {
        check_primitive_count(self.n(), &self.shape, &self.scale, &self.log_t, &self.log_start)?;
        check_log_start(&self.log_start)?;
        check_transitions(&self.log_t)
    }

    /// Transition distribution out of primitive `prev_state`:
    /// `exp(logT[prev_state]) / Σ exp(logT[prev_state])`.
    ///
    /// # Errors
    /// - [`LibError::InvalidState`] if `prev_state >= N`.
    pub fn p_t(&self, prev_state: usize) -> LibResult<Array1<f64>> {
        if prev_state >= self.n() {
            return Err(LibError::InvalidState { state: prev_state, n: self.n() });
        }
        Ok(normalize_log_probs(self.log_t.row(prev_state)))
    }

    /// Remove every primitive not flagged in `keep`.
    ///
    /// # Errors
    /// Always [`LibError::NotSupported`].
    pub fn restrict_library(&mut self, _keep: &[bool]) -> LibResult<()> {
        Err(LibError::NotSupported { operation: "restrict_library" })
    }

    /// Number of primitives `N`.
    pub fn n(&self) -> usize {
        self.shape.mu.nrows()
    }

    /// Number of control points per sub-stroke.
    pub fn ncpt(&self) -> usize {
        self.shape.ncpt()
    }

    /// `true` if any shape mean is undefined (a non-informative library).
    pub fn isunif(&self) -> bool {
        self.shape.mu.iter().any(|v| v.is_nan())
    }

    pub fn shape(&self) -> &ShapeParams {
        &self.shape
    }

    pub fn scale(&self) -> &ScaleParams {
        &self.scale
    }

    pub fn rel(&self) -> &RelParams {
        &self.rel
    }

    pub fn tokenvar(&self) -> &ParamGroup {
        &self.tokenvar
    }

    pub fn affine(&self) -> &ParamGroup {
        &self.affine
    }

    pub fn stat(&self) -> &ParamGroup {
        &self.stat
    }

    pub fn log_t(&self) -> &Array2<f64> {
        &self.log_t
    }

    pub fn log_start(&self) -> &Array1<f64> {
        &self.log_start
    }

    pub fn pkappa(&self) -> &Array1<f64> {
        &self.pkappa
    }

    pub fn pmat_nsub(&self) -> &Array2<f64> {
        &self.pmat_nsub
    }

    pub fn newscale(&self) -> &ArrayD<f64> {
        &self.newscale
    }

    pub fn smooth_bigrams(&self) -> &ArrayD<f64> {
        &self.smooth_bigrams
    }

    pub fn diag_sigma(&self) -> &ArrayD<bool> {
        &self.diag_sigma
    }

    pub fn spatial(&self) -> &SpatialModel {
        &self.spatial
    }
}

// ---- Helper methods ----

/// `logT` for a single primitive squeezes down to a scalar.
fn restore_square(log_t: ArrayD<f64>) -> ArrayD<f64> {
    if log_t.ndim() == 0 { restore_axis(restore_axis(log_t, 1, 0), 2, 0) } else { log_t }
}

/// `pmat_nsub` has one row per stroke count; a single row or a single
/// column squeezes to rank 1, and the row count tells the two apart.
fn restore_rows(pmat: ArrayD<f64>, rows: usize) -> ArrayD<f64> {
    match pmat.ndim() {
        0 => restore_axis(restore_axis(pmat, 1, 0), 2, 0),
        1 if rows != 1 && pmat.len() == rows => pmat.insert_axis(Axis(1)),
        _ => restore_axis(pmat, 2, 0),
    }
}

fn load_spatial(spatial_dir: &Path) -> LibResult<SpatialModel> {
    if !spatial_dir.is_dir() {
        return Err(LibError::MissingParameter { name: SPATIAL_DIR.to_string() });
    }
    let hists = source::list_subdirs(spatial_dir)?
        .iter()
        .map(|dir| load_hist(dir))
        .collect::<LibResult<Vec<_>>>()?;
    SpatialModel::new(hists)
}

fn load_hist(dir: &Path) -> LibResult<SpatialHist> {
    let field = |name: &str| -> LibResult<ArrayD<f64>> {
        let path = param_path(dir, name);
        if !path.is_file() {
            let hist = dir.file_name().and_then(|s| s.to_str()).unwrap_or_default();
            return Err(LibError::MissingParameter { name: format!("{SPATIAL_DIR}/{hist}/{name}") });
        }
        Ok(source::squeeze(source::read_array(&path)?))
    };
    let xlab = into_rank1("xlab", field("xlab")?)?;
    let ylab = into_rank1("ylab", field("ylab")?)?;
    // Squeezing flattens single-row or single-column grids; the edges fix the shape.
    let raw = field("logpYX")?;
    let ndim = raw.ndim();
    let grid_dim = (ylab.len().saturating_sub(1), xlab.len().saturating_sub(1));
    let log_pyx = if ndim < 2 && raw.len() == grid_dim.0 * grid_dim.1 {
        Array2::from_shape_vec(grid_dim, raw.iter().copied().collect()).map_err(|_| {
            LibError::RankMismatch { field: "logpYX".to_string(), expected: 2, found: ndim }
        })?
    } else {
        into_rank2("logpYX", raw)?
    };
    let rg_bin = into_rank1("rg_bin", field("rg_bin")?)?;
    if rg_bin.len() != 2 {
        return Err(LibError::ShapeMismatch {
            field: "rg_bin".to_string(),
            expected: 2,
            found: rg_bin.len(),
        });
    }
    let prior_count = into_rank1("prior_count", field("prior_count")?)?;
    if prior_count.len() != 1 {
        return Err(LibError::ShapeMismatch {
            field: "prior_count".to_string(),
            expected: 1,
            found: prior_count.len(),
        });
    }
    SpatialHist::new(log_pyx, xlab, ylab, [rg_bin[0], rg_bin[1]], prior_count[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{source::write_array, synthetic::SyntheticLibrary};
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::fs;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Loading a synthetic source end to end (dimensions, reindexing,
    //   diagSigma coercion, spatial ordering).
    // - Each construction invariant failing on a corrupted source.
    // - `p_t` normalization and range errors, `isunif`, `restrict_library`.
    //
    // Fixture
    // -------
    // - `SyntheticLibrary::default()` written into a `tempfile` directory.
    // -------------------------------------------------------------------------

    fn synthetic_dir(spec: &SyntheticLibrary) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        spec.write_to(dir.path()).expect("synthetic source is written");
        dir
    }

    #[test]
    // Purpose
    // -------
    // Verify that a well-formed source loads with the expected dimensions.
    //
    // Given
    // -----
    // - A synthetic source with N = 3, ncpt = 5, and 3 relation histograms.
    //
    // Expect
    // ------
    // - `n() == 3`, `ncpt() == 5`, Sigma native shape `(3, 10, 10)`,
    //   three histograms, `diagSigma` boolean, `isunif() == false`.
    fn load_synthetic_library() {
        // Arrange
        let spec = SyntheticLibrary { n_primitives: 3, ncpt: 5, n_relations: 3, ..Default::default() };
        let dir = synthetic_dir(&spec);

        // Act
        let lib = Library::load(dir.path()).expect("library loads");

        // Assert
        assert_eq!(lib.n(), 3);
        assert_eq!(lib.ncpt(), 5);
        assert_eq!(lib.shape().sigma.dim(), (3, 10, 10));
        assert_eq!(lib.spatial().len(), 3);
        assert!(lib.diag_sigma().iter().any(|&b| b));
        assert!(!lib.isunif());
        assert!(lib.check_consistent().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // A single-column `pmat_nsub` keeps one row per stroke count after the
    // loader squeezes it.
    //
    // Given
    // -----
    // - A synthetic source with 3 stroke counts and 1 sub-stroke count.
    //
    // Expect
    // ------
    // - `pmat_nsub` is `(3, 1)` and the type distribution builds.
    fn single_column_pmat_nsub_keeps_rows() {
        // Arrange
        let spec = SyntheticLibrary { max_strokes: 3, max_substrokes: 1, ..Default::default() };
        let dir = synthetic_dir(&spec);

        // Act
        let lib = Library::load(dir.path()).expect("library loads");

        // Assert
        assert_eq!(lib.pmat_nsub().dim(), (3, 1));
        assert!(crate::ctd::CharacterTypeDist::new(&lib).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // The loaded means and covariances are the native tensors the writer
    // started from, so the inverse reindex on write and the forward reindex
    // on load agree.
    fn load_recovers_native_shape_params() {
        let spec = SyntheticLibrary::default();
        let dir = synthetic_dir(&spec);

        let lib = Library::load(dir.path()).unwrap();

        assert_eq!(lib.shape().mu, spec.native_mu());
        assert_eq!(lib.shape().sigma, spec.native_sigma());
    }

    #[test]
    // Purpose
    // -------
    // `p_t` returns a normalized distribution for every state and rejects
    // states outside `[0, N)`.
    fn p_t_is_normalized_and_range_checked() {
        let dir = synthetic_dir(&SyntheticLibrary::default());
        let lib = Library::load(dir.path()).unwrap();
        let n = lib.n();

        for s in 0..n {
            let p = lib.p_t(s).expect("valid state");
            assert_eq!(p.len(), n);
            assert_relative_eq!(p.sum(), 1.0, epsilon = 1e-12);
        }
        assert_eq!(lib.p_t(n), Err(LibError::InvalidState { state: n, n }));
    }

    #[test]
    // Purpose
    // -------
    // Each missing piece of the source is reported by name.
    fn load_reports_missing_parameters() {
        let dir = synthetic_dir(&SyntheticLibrary::default());
        fs::remove_file(param_path(dir.path(), "pkappa")).unwrap();
        let err = Library::load(dir.path()).unwrap_err();
        assert_eq!(err, LibError::MissingParameter { name: "pkappa".to_string() });

        let dir = synthetic_dir(&SyntheticLibrary::default());
        fs::remove_dir_all(dir.path().join("affine")).unwrap();
        let err = Library::load(dir.path()).unwrap_err();
        assert_eq!(err, LibError::MissingParameter { name: "affine".to_string() });

        let dir = synthetic_dir(&SyntheticLibrary::default());
        fs::remove_file(param_path(&dir.path().join("shape"), "freq")).unwrap();
        let err = Library::load(dir.path()).unwrap_err();
        assert_eq!(err, LibError::MissingParameter { name: "shape/freq".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Corrupted normalization and dimensions abort construction.
    //
    // Given
    // -----
    // - A source whose logStart sums to 1.2 in probability space.
    // - A source whose logStart has the wrong length.
    //
    // Expect
    // ------
    // - `NotNormalized` and `ShapeMismatch` respectively.
    fn load_rejects_broken_invariants() {
        // Arrange
        let spec = SyntheticLibrary::default();
        let n = spec.n_primitives;
        let dir = synthetic_dir(&spec);
        let heavy = Array1::from_elem(n, (1.2 / n as f64).ln()).into_dyn();
        write_array(&param_path(dir.path(), "logStart"), heavy.view()).unwrap();

        let dir2 = synthetic_dir(&spec);
        let short = Array1::from_elem(n - 1, (1.0 / (n - 1) as f64).ln()).into_dyn();
        write_array(&param_path(dir2.path(), "logStart"), short.view()).unwrap();

        // Act
        let err = Library::load(dir.path()).unwrap_err();
        let err2 = Library::load(dir2.path()).unwrap_err();

        // Assert
        assert!(matches!(err, LibError::NotNormalized { ref field, .. } if field == "logStart"));
        assert_eq!(
            err2,
            LibError::ShapeMismatch { field: "logStart".to_string(), expected: n, found: n - 1 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Histograms are ordered by directory name, not creation order.
    fn spatial_hists_load_in_name_order() {
        let spec = SyntheticLibrary { n_relations: 2, ..Default::default() };
        let dir = synthetic_dir(&spec);
        // A later-sorting directory whose grid is shifted right.
        let extra = dir.path().join(SPATIAL_DIR).join("SH_zz");
        for (name, value) in [
            ("logpYX", array![[0.0]].into_dyn()),
            ("xlab", array![[5.0, 6.0]].into_dyn()),
            ("ylab", array![[5.0, 6.0]].into_dyn()),
            ("rg_bin", array![[1.0, 1.0]].into_dyn()),
            ("prior_count", array![[0.0]].into_dyn()),
        ] {
            write_array(&param_path(&extra, name), value.view()).unwrap();
        }

        let lib = Library::load(dir.path()).unwrap();

        assert_eq!(lib.spatial().len(), 3);
        assert_eq!(lib.spatial().hist(2).unwrap().xlab()[0], 5.0);
        assert!(matches!(lib.spatial().hist(3), Err(LibError::InvalidRelation { rid: 3, len: 3 })));
    }

    #[test]
    // Purpose
    // -------
    // An undefined shape mean marks the library non-informative, and
    // restricting the library is declared but unsupported.
    fn isunif_and_restrict_library() {
        let spec = SyntheticLibrary { uniform: true, ..Default::default() };
        let dir = synthetic_dir(&spec);

        let mut lib = Library::load(dir.path()).expect("NaN means are allowed");

        assert!(lib.isunif());
        assert_eq!(
            lib.restrict_library(&[true, false, true]),
            Err(LibError::NotSupported { operation: "restrict_library" })
        );
    }
}
