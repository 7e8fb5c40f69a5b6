use crate::error::BayesrError;
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, Exp1, Gamma, StandardNormal};

/// k i.i.d. N(0, 1) draws.
pub(crate) fn standard_normal_vector<R: Rng + ?Sized>(k: usize, rng: &mut R) -> Array1<f64> {
    Array1::<f64>::from_shape_fn(k, |_| StandardNormal.sample(rng))
}

/// Draw from N(mean, U'U) given the upper Cholesky factor `U` of the covariance.
pub(crate) fn sample_from_upper_cholesky<R: Rng + ?Sized>(
    mean: &Array1<f64>,
    u_factor: &Array2<f64>,
    rng: &mut R,
) -> Array1<f64> {
    let z = standard_normal_vector(mean.len(), rng);
    u_factor.t().dot(&z) + mean
}

pub(crate) fn sample_exp1<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    Exp1.sample(rng)
}

/// Uniform draw on `[low, high)`; a degenerate interval returns `low`.
pub(crate) fn sample_uniform<R: Rng + ?Sized>(low: f64, high: f64, rng: &mut R) -> f64 {
    low + (high - low) * rng.random::<f64>()
}

/// Inverse-gamma draw as the reciprocal of a Gamma(shape, 1/scale) variate.
pub(crate) fn sample_inverse_gamma<R: Rng + ?Sized>(
    shape: f64,
    scale: f64,
    rng: &mut R,
) -> Result<f64, BayesrError> {
    let gamma = Gamma::new(shape, 1.0 / scale).map_err(|e| {
        BayesrError::Input(format!(
            "invalid inverse gamma parameters (shape {}, scale {}): {}",
            shape, scale, e
        ))
    })?;
    Ok(1.0 / gamma.sample(rng))
}
