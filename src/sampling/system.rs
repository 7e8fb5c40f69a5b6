use crate::error::BayesrError;
use crate::linalg;
use crate::math::quad_form;
use crate::types::{CovarianceMatrix, ModelMatrix, PenaltyMatrix, PrecisionMatrix};
use ndarray::{Array1, Array2, Axis};

/// Penalized IWLS normal equations of one term, linearized at a given fit.
///
/// Holds the precision `P = X'WX + S/tau2`, its upper Cholesky factor
/// (`P = U'U`), the inverse `P^-1` and the Gaussian mean `mu = P^-1 X'W z2`.
pub(crate) struct IwlsSystem {
    pub(crate) precision: PrecisionMatrix,
    pub(crate) covariance: CovarianceMatrix,
    pub(crate) mean: Array1<f64>,
    /// `sum_j log(U_jj^2) = log|P|`
    pub(crate) log_det: f64,
    /// `eta[id]` with this term's contribution removed.
    pub(crate) eta_other: Array1<f64>,
}

impl IwlsSystem {
    /// Builds and factors the system.
    ///
    /// The working observations are `z = eta + score / W`; the term is fitted to
    /// `z2 = z - eta_other`, i.e. the partial working residual of the other terms.
    pub(crate) fn build(
        x: &ModelMatrix,
        penalty: Option<&PenaltyMatrix>,
        tau2: f64,
        weights: &Array1<f64>,
        score: &Array1<f64>,
        eta: &Array1<f64>,
        fit: &Array1<f64>,
    ) -> Result<Self, BayesrError> {
        // XW[j, i] = X[i, j] * W[i], k x n
        let xw: Array2<f64> = &x.t() * &weights.view().insert_axis(Axis(0));

        let z = eta + &(score / weights);
        let eta_other = eta - fit;
        let z2 = &z - &eta_other;

        let mut precision = linalg::gemm(&xw, &x.0);
        if let Some(s) = penalty {
            precision.scaled_add(1.0 / tau2, &s.0);
        }

        let factor = linalg::cholesky_upper(&precision)?;
        let covariance = linalg::inv_from_cholesky_upper(&factor)?;

        let xw_z2 = xw.dot(&z2);
        let mean = covariance.dot(&xw_z2);
        let log_det = linalg::log_det_from_cholesky(&factor);

        Ok(Self {
            precision: PrecisionMatrix(precision),
            covariance: CovarianceMatrix(covariance),
            mean,
            log_det,
            eta_other,
        })
    }

    /// Log density of `N(mean, P^-1)` at `g`, up to the `-k/2 log(2 pi)` constant.
    pub(crate) fn log_density(&self, g: &Array1<f64>) -> f64 {
        let centered = g - &self.mean;
        0.5 * self.log_det - 0.5 * quad_form(&self.precision, &centered)
    }
}
