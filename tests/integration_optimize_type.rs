//! Integration tests for the library → type distribution → optimizer flow.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path on a synthetic parameter source written to
//!   disk: loading, sampling a type, and refining it with `optimize_type`.
//! - Exercise the failure path where the starting type is impossible under
//!   the prior.
//!
//! Coverage
//! --------
//! - `library`: `SyntheticLibrary::write_to` and `Library::load` with N = 3,
//!   ncpt = 5.
//! - `ctd`: `CharacterTypeDist::new`, `sample_type`, `score_type`.
//! - `optimization::type_optimizer`: projected and penalized runs, the
//!   degenerate-type error, and feasibility of the final parameters.
//!
//! Exclusions
//! ----------
//! - Projection and solver details on toy problems; those are covered by
//!   unit tests.
use rand::{SeedableRng, rngs::StdRng};
use rust_bpl::{
    ctd::{Character, CharacterTypeDist},
    library::{Library, SyntheticLibrary},
    optimization::{
        errors::OptError,
        type_optimizer::{Parameterized, optimize_type, projection::is_feasible},
    },
};

/// Load a synthetic library with 3 primitives and 5 control points.
fn load_library() -> Library {
    let dir = tempfile::tempdir().expect("temp dir");
    let spec = SyntheticLibrary { n_primitives: 3, ncpt: 5, ..Default::default() };
    spec.write_to(dir.path()).expect("write synthetic source");
    Library::load(dir.path()).expect("load synthetic source")
}

fn sample_two_strokes(dist: &CharacterTypeDist<'_>, seed: u64) -> Character {
    let mut rng = StdRng::seed_from_u64(seed);
    dist.sample_type(Some(2), &mut rng).expect("sample a 2-stroke type")
}

#[test]
// Purpose
// -------
// Ten projected iterations at lr = 1e-3 return ten scores that do not
// decrease, and leave the type feasible with its structure intact.
//
// Given
// -----
// - N = 3, ncpt = 5, a sampled 2-stroke type, eps = 1e-4.
//
// Expect
// ------
// - 10 scores, last ≥ first, the first equal to the starting score.
// - Same stroke and sub-stroke counts; parameters feasible.
fn optimize_type_end_to_end() {
    // Arrange
    let lib = load_library();
    assert_eq!((lib.n(), lib.ncpt()), (3, 5));
    let dist = CharacterTypeDist::new(&lib).expect("build distribution");

    for seed in 0..5 {
        let mut c = sample_two_strokes(&dist, seed);
        let nsub = c.nsub();
        let s0 = dist.score_type(&c).expect("score start");

        // Act
        let scores = optimize_type(&mut c, &dist, 1e-3, 10, 1e-4, true).expect("optimize");

        // Assert
        assert_eq!(scores.len(), 10);
        assert_eq!(scores[0], s0);
        assert!(scores[9] >= scores[0]);
        assert!(scores.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(c.k(), 2);
        assert_eq!(c.nsub(), nsub);
        assert!(is_feasible(&c.theta(), &c.layout(), 1e-4));
        assert!(dist.score_type(&c).expect("score end") >= s0);
    }
}

#[test]
// Purpose
// -------
// A type whose starting score is `-∞` fails with `DegenerateType` at
// iteration 0 and is left exactly as it was.
//
// Given
// -----
// - A sampled 2-stroke type with one inverse scale set to -1.
//
// Expect
// ------
// - `OptError::DegenerateType { iteration: 0, .. }`; the type is unchanged.
fn degenerate_type_is_rejected_untouched() {
    // Arrange
    let lib = load_library();
    let dist = CharacterTypeDist::new(&lib).expect("build distribution");
    let mut c = sample_two_strokes(&dist, 1);
    c.strokes[0].invscales[0] = -1.0;
    let before = c.clone();

    // Act
    let err = optimize_type(&mut c, &dist, 1e-3, 10, 1e-4, true).expect_err("degenerate start");

    // Assert
    assert!(matches!(err, OptError::DegenerateType { iteration: 0, .. }));
    assert_eq!(c, before);
}

#[test]
// Purpose
// -------
// Without projection a degenerate start is still rejected before any
// update, even though the penalized objective is finite there.
//
// Given
// -----
// - The same 2-stroke type with one inverse scale set to -1.
// - `proj_grad_ascent = false`.
//
// Expect
// ------
// - `OptError::DegenerateType { iteration: 0, .. }`; the type is unchanged.
fn degenerate_type_is_rejected_untouched_without_projection() {
    // Arrange
    let lib = load_library();
    let dist = CharacterTypeDist::new(&lib).expect("build distribution");
    let mut c = sample_two_strokes(&dist, 1);
    c.strokes[0].invscales[0] = -1.0;
    let before = c.clone();

    // Act
    let err = optimize_type(&mut c, &dist, 1e-3, 10, 1e-4, false).expect_err("degenerate start");

    // Assert
    assert!(matches!(err, OptError::DegenerateType { iteration: 0, .. }));
    assert_eq!(c, before);
}

#[test]
// Purpose
// -------
// The penalized mode runs on a real type and improves its objective.
fn penalized_mode_end_to_end() {
    let lib = load_library();
    let dist = CharacterTypeDist::new(&lib).expect("build distribution");
    let mut c = sample_two_strokes(&dist, 3);

    let scores = optimize_type(&mut c, &dist, 1e-3, 10, 1e-4, false).expect("optimize");

    assert_eq!(scores.len(), 10);
    assert!(scores[9] >= scores[0]);
    assert_eq!(c.k(), 2);
}
