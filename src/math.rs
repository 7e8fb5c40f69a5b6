use ndarray::{Array1, Array2};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use statrs::function::gamma::digamma as statrs_digamma;

/// Threshold for using parallel computation (below this, sequential is faster).
///
/// Below 10k observations, Rayon overhead exceeds the benefit of parallelization.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 10_000;

/// Quadratic form `x' A x`.
#[inline]
pub fn quad_form(a: &Array2<f64>, x: &Array1<f64>) -> f64 {
    x.dot(&a.dot(x))
}

/// Trigamma `psi'(x)` for `x > 0`, NaN otherwise.
///
/// Shifts the argument up with `psi'(x) = psi'(x + 1) + 1/x^2` until `x >= 6`,
/// then sums the asymptotic series `1/x + 1/(2x^2) + sum_k B_2k / x^(2k+1)`
/// through `B_10`. Absolute error stays below 1e-10.
pub fn trigamma(x: f64) -> f64 {
    if x.is_nan() || x <= 0.0 {
        return f64::NAN;
    }

    let mut z = x;
    let mut shifted = 0.0;
    while z < 6.0 {
        shifted += z.powi(-2);
        z += 1.0;
    }

    let r = z.recip();
    let r2 = r * r;
    let bernoulli_tail =
        r2 * r * (1.0 / 6.0 - r2 * (1.0 / 30.0 - r2 * (1.0 / 42.0 - r2 * (1.0 / 30.0 - r2 * 5.0 / 66.0))));

    shifted + r + 0.5 * r2 + bernoulli_tail
}

/// Batch digamma over an array.
///
/// With the `parallel` feature and n >= 10,000 the work is split with Rayon.
#[inline]
pub fn digamma_batch(x: &Array1<f64>) -> Array1<f64> {
    map_batch(x, statrs_digamma)
}

/// Batch trigamma over an array. Same parallelization rule as [`digamma_batch`].
#[inline]
pub fn trigamma_batch(x: &Array1<f64>) -> Array1<f64> {
    map_batch(x, trigamma)
}

#[cfg(feature = "parallel")]
fn map_batch(x: &Array1<f64>, f: fn(f64) -> f64) -> Array1<f64> {
    if x.len() < PARALLEL_THRESHOLD {
        return x.mapv(f);
    }
    match x.as_slice() {
        Some(values) => Array1::from_vec(values.par_iter().map(|&v| f(v)).collect()),
        None => x.mapv(f),
    }
}

#[cfg(not(feature = "parallel"))]
fn map_batch(x: &Array1<f64>, f: fn(f64) -> f64) -> Array1<f64> {
    x.mapv(f)
}
