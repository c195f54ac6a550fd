//! library::reindex — storage ↔ native layout of the shape parameters.
//!
//! Purpose
//! -------
//! The parameter source stores the control-point means and covariances in a
//! coordinate-major, column-major layout: all x coordinates of a primitive's
//! control points come first, then all y coordinates, and covariance stacks
//! carry the primitive index on the trailing axis. Sampling and scoring work
//! point-major with the primitive index first. This module is the single
//! place where the two conventions meet.
//!
//! Key behaviors
//! -------------
//! - [`mu_to_native`] / [`mu_to_storage`]:
//!   `native[n, 2c + d] = storage[n, d·ncpt + c]` for control point `c` and
//!   coordinate `d ∈ {0, 1}`.
//! - [`sigma_to_native`] / [`sigma_to_storage`]:
//!   `native[n, 2c₁ + d₁, 2c₂ + d₂] = storage[d₁·ncpt + c₁, d₂·ncpt + c₂, n]`,
//!   with storage shape `(2·ncpt, 2·ncpt, N)` and native shape
//!   `(N, 2·ncpt, 2·ncpt)`.
//! - Each pair is mutually inverse; both directions are pure and allocate a
//!   fresh array.
//!
//! Invariants & assumptions
//! ------------------------
//! - Widths are even; callers validate this before reindexing (see
//!   `library::validation`).
//! - Values are moved, never transformed; NaN entries survive untouched.
use ndarray::{Array2, Array3};

/// Storage column holding native column `j` of a `2·ncpt`-wide block.
#[inline]
fn storage_col(j: usize, ncpt: usize) -> usize {
    (j % 2) * ncpt + j / 2
}

/// Native column holding storage column `i` of a `2·ncpt`-wide block.
#[inline]
fn native_col(i: usize, ncpt: usize) -> usize {
    2 * (i % ncpt) + i / ncpt
}

/// Reorder `shape/mu` from storage (x block, then y block) to native
/// (interleaved `x₀ y₀ x₁ y₁ …`) order.
pub fn mu_to_native(storage: &Array2<f64>) -> Array2<f64> {
    let (n, width) = storage.dim();
    let ncpt = width / 2;
    Array2::from_shape_fn((n, width), |(row, j)| storage[[row, storage_col(j, ncpt)]])
}

/// Inverse of [`mu_to_native`].
pub fn mu_to_storage(native: &Array2<f64>) -> Array2<f64> {
    let (n, width) = native.dim();
    let ncpt = width / 2;
    Array2::from_shape_fn((n, width), |(row, i)| native[[row, native_col(i, ncpt)]])
}

/// Reorder `shape/Sigma` from storage `(2·ncpt, 2·ncpt, N)` to native
/// `(N, 2·ncpt, 2·ncpt)`, regrouping rows and columns by control point.
pub fn sigma_to_native(storage: &Array3<f64>) -> Array3<f64> {
    let (width, _, n) = storage.dim();
    let ncpt = width / 2;
    Array3::from_shape_fn((n, width, width), |(k, a, b)| {
        storage[[storage_col(a, ncpt), storage_col(b, ncpt), k]]
    })
}

/// Inverse of [`sigma_to_native`].
pub fn sigma_to_storage(native: &Array3<f64>) -> Array3<f64> {
    let (n, width, _) = native.dim();
    let ncpt = width / 2;
    Array3::from_shape_fn((width, width, n), |(i, j, k)| {
        native[[k, native_col(i, ncpt), native_col(j, ncpt)]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Pin the mu mapping on a hand-checked example.
    //
    // Given
    // -----
    // - One primitive with ncpt = 3 stored as `[x0 x1 x2 y0 y1 y2]`.
    //
    // Expect
    // ------
    // - Native order `[x0 y0 x1 y1 x2 y2]`.
    fn mu_to_native_interleaves_coordinates() {
        // Arrange
        let storage = array![[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]];

        // Act
        let native = mu_to_native(&storage);

        // Assert
        assert_eq!(native, array![[0.0, 10.0, 1.0, 11.0, 2.0, 12.0]]);
    }

    #[test]
    // Purpose
    // -------
    // Storage → native → storage is the identity for both tensors, and
    // native → storage → native is too.
    //
    // Given
    // -----
    // - N = 3, ncpt = 5 tensors filled with distinct values.
    //
    // Expect
    // ------
    // - Exact equality after each round trip.
    fn reindex_round_trips_exactly() {
        // Arrange
        let (n, ncpt) = (3, 5);
        let w = 2 * ncpt;
        let mu = Array2::from_shape_fn((n, w), |(i, j)| (i * 100 + j) as f64);
        let sigma = Array3::from_shape_fn((w, w, n), |(i, j, k)| (k * 10_000 + i * 100 + j) as f64);

        // Act
        let mu_back = mu_to_storage(&mu_to_native(&mu));
        let sigma_back = sigma_to_storage(&sigma_to_native(&sigma));
        let sigma_native = sigma_to_native(&sigma);
        let sigma_native_back = sigma_to_native(&sigma_to_storage(&sigma_native));

        // Assert
        assert_eq!(mu_back, mu);
        assert_eq!(sigma_back, sigma);
        assert_eq!(sigma_native_back, sigma_native);
        assert_eq!(mu_to_native(&mu_to_storage(&mu)), mu);
    }

    #[test]
    // Purpose
    // -------
    // The covariance mapping agrees with the mean mapping: the variance of
    // native coordinate `(c, d)` is the storage diagonal entry at the
    // storage column of that coordinate, with the primitive moved first.
    fn sigma_to_native_matches_mu_ordering() {
        let (n, ncpt) = (2, 4);
        let w = 2 * ncpt;
        let diag = Array2::from_shape_fn((n, w), |(k, i)| (k * 50 + i + 1) as f64);
        let storage = Array3::from_shape_fn((w, w, n), |(i, j, k)| {
            if i == j { diag[[k, i]] } else { 0.0 }
        });

        let native = sigma_to_native(&storage);
        let diag_native = mu_to_native(&diag);

        for k in 0..n {
            for a in 0..w {
                assert_eq!(native[[k, a, a]], diag_native[[k, a]]);
            }
        }
        assert_eq!(native.dim(), (n, w, w));
    }
}
