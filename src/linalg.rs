//! Linear algebra backend abstraction layer.
//!
//! This module provides the dense kernel used by the IWLS proposal engine,
//! supporting multiple backends:
//! - `openblas`: Uses ndarray-linalg with OpenBLAS/LAPACK (default)
//! - `pure-rust`: Uses faer for a pure Rust implementation
//!
//! The backend is selected at compile time via feature flags. Cholesky factors
//! follow the LAPACK `"Upper"` convention throughout: `A = U'U`.

use crate::BayesrError;
use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, ArrayBase, Data, Ix2};

/// Result type for linear algebra operations.
pub type Result<T> = std::result::Result<T, BayesrError>;

/// Dense matrix product `A * B` through ndarray's GEMM.
///
/// Arrays are row-major, so the weighted design transpose is built explicitly
/// by the caller rather than passing transpose flags.
pub fn gemm<S1, S2>(a: &ArrayBase<S1, Ix2>, b: &ArrayBase<S2, Ix2>) -> Array2<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    let mut c = Array2::<f64>::zeros((a.nrows(), b.ncols()));
    general_mat_mul(1.0, a, b, 0.0, &mut c);
    c
}

/// Mirrors the upper triangle into the lower one.
pub fn symmetrize_upper(a: &mut Array2<f64>) {
    let n = a.nrows();
    for j in 0..n {
        for i in (j + 1)..n {
            a[[i, j]] = a[[j, i]];
        }
    }
}

/// Inverse of an SPD matrix from its upper Cholesky factor (`potri` semantics).
///
/// With `A = U'U`, `A^-1 = U^-1 U^-T`. The result is symmetrized from its
/// upper triangle.
pub fn inv_from_cholesky_upper(u: &Array2<f64>) -> Result<Array2<f64>> {
    let u_inv = inv_upper_triangular(u)?;
    let mut a_inv = gemm(&u_inv, &u_inv.t());
    symmetrize_upper(&mut a_inv);
    Ok(a_inv)
}

/// Sum of `log(U_jj^2)`, i.e. `log|A|` for `A = U'U`.
pub fn log_det_from_cholesky(u: &Array2<f64>) -> f64 {
    u.diag().iter().map(|d| (d * d).ln()).sum()
}

// =============================================================================
// OpenBLAS Backend (default)
// =============================================================================

/// Upper Cholesky factor `U` with `A = U'U`. The strict lower triangle is zero.
#[cfg(feature = "openblas")]
pub fn cholesky_upper(a: &Array2<f64>) -> Result<Array2<f64>> {
    use ndarray_linalg::{Cholesky, UPLO};
    Ok(a.cholesky(UPLO::Upper)?)
}

/// Computes the inverse of an upper triangular matrix U.
///
/// The inverse is computed by solving U * X = I for X.
#[cfg(feature = "openblas")]
pub fn inv_upper_triangular(u: &Array2<f64>) -> Result<Array2<f64>> {
    use ndarray_linalg::triangular::{Diag, SolveTriangular};
    use ndarray_linalg::UPLO;
    let n = u.nrows();
    let identity = Array2::<f64>::eye(n);
    Ok(u.solve_triangular(UPLO::Upper, Diag::NonUnit, &identity)?)
}

// =============================================================================
// Pure Rust Backend (faer)
// =============================================================================

#[cfg(all(feature = "pure-rust", not(feature = "openblas")))]
pub fn cholesky_upper(a: &Array2<f64>) -> Result<Array2<f64>> {
    // Convert ndarray -> faer
    let a_faer = ndarray_to_faer_mat(a);

    let chol = a_faer.cholesky(faer::Side::Lower).map_err(|_| {
        BayesrError::Linalg(
            "Cholesky decomposition failed (matrix not positive definite)".to_string(),
        )
    })?;

    // faer hands back L with A = LL'; the upper factor is its transpose
    let l = faer_mat_to_ndarray(&chol.compute_l())?;
    Ok(l.reversed_axes())
}

#[cfg(all(feature = "pure-rust", not(feature = "openblas")))]
pub fn inv_upper_triangular(u: &Array2<f64>) -> Result<Array2<f64>> {
    let u_faer = ndarray_to_faer_mat(u);
    let n = u_faer.nrows();
    let mut dst = faer::Mat::<f64>::zeros(n, n);
    faer::linalg::triangular_inverse::invert_upper_triangular(
        dst.as_mut(),
        u_faer.as_ref(),
        faer::Parallelism::None,
    );
    faer_mat_to_ndarray(&dst)
}

// =============================================================================
// Conversion Helpers: ndarray <-> faer
// =============================================================================

#[cfg(all(feature = "pure-rust", not(feature = "openblas")))]
fn ndarray_to_faer_mat(arr: &Array2<f64>) -> faer::Mat<f64> {
    use faer::Mat;

    let (nrows, ncols) = arr.dim();
    Mat::from_fn(nrows, ncols, |i, j| arr[[i, j]])
}

#[cfg(all(feature = "pure-rust", not(feature = "openblas")))]
fn faer_mat_to_ndarray(mat: &faer::Mat<f64>) -> Result<Array2<f64>> {
    let (nrows, ncols) = (mat.nrows(), mat.ncols());
    let result = Array2::from_shape_fn((nrows, ncols), |(i, j)| mat.read(i, j));
    Ok(result)
}

// =============================================================================
// Tests
// =============================================================================
