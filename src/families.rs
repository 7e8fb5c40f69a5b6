use crate::error::BayesrError;
use crate::math::{digamma_batch, trigamma_batch};
use crate::types::{Parameters, Predictor};
use ndarray::{Array1, Zip};
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;
use std::fmt::Debug;

/// Lower bound for IWLS weights of families whose Fisher information can vanish.
const MIN_WEIGHT: f64 = 1e-6;
const MIN_POSITIVE: f64 = 1e-10;

// These traits help make sure the actual families are implemented correctly
pub trait Link: Debug + Send + Sync {
    fn link(&self, mu: f64) -> f64;
    fn inv_link(&self, eta: f64) -> f64;
}

// Concrete Links

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLink;
impl Link for IdentityLink {
    fn link(&self, mu: f64) -> f64 {
        mu
    }
    fn inv_link(&self, eta: f64) -> f64 {
        eta
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogLink;
impl Link for LogLink {
    fn link(&self, mu: f64) -> f64 {
        mu.ln().max(-30.0)
    }
    fn inv_link(&self, eta: f64) -> f64 {
        eta.min(30.0).exp()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogitLink;
impl Link for LogitLink {
    fn link(&self, mu: f64) -> f64 {
        // logit(mu) = log(mu / (1 - mu))
        let mu_clamped = mu.clamp(1e-10, 1.0 - 1e-10);
        (mu_clamped / (1.0 - mu_clamped)).ln()
    }
    fn inv_link(&self, eta: f64) -> f64 {
        // inverse logit = 1 / (1 + exp(-eta))
        let eta_clamped = eta.clamp(-30.0, 30.0);
        1.0 / (1.0 + (-eta_clamped).exp())
    }
}

/// Numeric contract between a response distribution and the samplers.
///
/// `score` and `weights` are the first derivative of the log-likelihood and the
/// Fisher information, both with respect to the linear predictor of parameter
/// `id`. Weights must be strictly positive.
pub trait Family: Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn parameters(&self) -> &[&'static str];
    fn default_link(&self, param: &str) -> Result<Box<dyn Link>, BayesrError>;

    /// Maps linear predictors to the distribution parameters via each parameter's inverse link.
    fn map2par(&self, eta: &Predictor) -> Result<Parameters, BayesrError> {
        let mut params = Parameters::new();
        for param in self.parameters() {
            let link = self.default_link(param)?;
            let eta_param = eta.get_term(param)?;
            params.insert(*param, eta_param.mapv(|e| link.inv_link(e)));
        }
        Ok(params)
    }

    fn loglik(&self, y: &Array1<f64>, params: &Parameters) -> Result<f64, BayesrError>;
    fn score(&self, id: &str, y: &Array1<f64>, params: &Parameters)
        -> Result<Array1<f64>, BayesrError>;
    fn weights(
        &self,
        id: &str,
        y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError>;

    fn unknown_parameter(&self, param: &str) -> BayesrError {
        BayesrError::UnknownParameter {
            family: self.name().to_string(),
            param: param.to_string(),
        }
    }
}

// Families
#[derive(Debug, Clone, Copy, Default)]
pub struct Gaussian;
impl Gaussian {
    pub fn new() -> Self {
        Self
    }
}

impl Family for Gaussian {
    fn name(&self) -> &'static str {
        "Gaussian"
    }
    // Gaussian has two parameters: mu is the mean, sigma the standard deviation.
    fn parameters(&self) -> &[&'static str] {
        &["mu", "sigma"]
    }
    fn default_link(&self, param: &str) -> Result<Box<dyn Link>, BayesrError> {
        match param {
            "mu" => Ok(Box::new(IdentityLink)),
            "sigma" => Ok(Box::new(LogLink)),
            _ => Err(self.unknown_parameter(param)),
        }
    }

    fn loglik(&self, y: &Array1<f64>, params: &Parameters) -> Result<f64, BayesrError> {
        // l = -0.5*log(2*pi) - log(sigma) - (y-mu)^2/(2*sigma^2)
        let mu = params.get_param(self.name(), "mu")?;
        let sigma = params.get_param(self.name(), "sigma")?;
        let half_log_2pi = 0.5 * (2.0 * PI).ln();

        let ll = Zip::from(y)
            .and(mu)
            .and(sigma)
            .fold(0.0, |acc, &yi, &m, &s| {
                acc - half_log_2pi - s.ln() - (yi - m).powi(2) / (2.0 * s * s)
            });
        Ok(ll)
    }

    fn score(
        &self,
        id: &str,
        y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError> {
        let mu = params.get_param(self.name(), "mu")?;
        let sigma = params.get_param(self.name(), "sigma")?;
        match id {
            // dl/dmu = (y-mu)/sigma^2
            "mu" => Ok(Zip::from(y)
                .and(mu)
                .and(sigma)
                .map_collect(|&yi, &m, &s| (yi - m) / (s * s))),
            // log link: dl/d(log sigma) = [(y-mu)^2 - sigma^2] / sigma^2
            "sigma" => Ok(Zip::from(y)
                .and(mu)
                .and(sigma)
                .map_collect(|&yi, &m, &s| ((yi - m).powi(2) - s * s) / (s * s))),
            _ => Err(self.unknown_parameter(id)),
        }
    }

    fn weights(
        &self,
        id: &str,
        _y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError> {
        let sigma = params.get_param(self.name(), "sigma")?;
        match id {
            "mu" => Ok(sigma.mapv(|s| 1.0 / (s * s))),
            // Var[(Y-mu)^2/sigma^2] = 2 for the normal
            "sigma" => Ok(Array1::from_elem(sigma.len(), 2.0)),
            _ => Err(self.unknown_parameter(id)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Poisson;
impl Poisson {
    pub fn new() -> Self {
        Self
    }
}

impl Family for Poisson {
    fn name(&self) -> &'static str {
        "Poisson"
    }
    fn parameters(&self) -> &[&'static str] {
        &["mu"]
    }
    fn default_link(&self, param: &str) -> Result<Box<dyn Link>, BayesrError> {
        match param {
            "mu" => Ok(Box::new(LogLink)),
            _ => Err(self.unknown_parameter(param)),
        }
    }

    fn loglik(&self, y: &Array1<f64>, params: &Parameters) -> Result<f64, BayesrError> {
        // l = y*log(mu) - mu - log(y!)
        let mu = params.get_param(self.name(), "mu")?;
        let ll = Zip::from(y).and(mu).fold(0.0, |acc, &yi, &m| {
            let m = m.max(MIN_POSITIVE);
            acc + yi * m.ln() - m - ln_gamma(yi + 1.0)
        });
        Ok(ll)
    }

    fn score(
        &self,
        id: &str,
        y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError> {
        match id {
            // log link: dl/deta = y - mu
            "mu" => {
                let mu = params.get_param(self.name(), "mu")?;
                Ok(y - mu)
            }
            _ => Err(self.unknown_parameter(id)),
        }
    }

    fn weights(
        &self,
        id: &str,
        _y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError> {
        match id {
            // Fisher information on the eta scale equals Var(Y) = mu
            "mu" => {
                let mu = params.get_param(self.name(), "mu")?;
                Ok(mu.mapv(|m| m.max(MIN_WEIGHT)))
            }
            _ => Err(self.unknown_parameter(id)),
        }
    }
}

/// Bernoulli responses (y in {0, 1}) with a logit link.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binomial;
impl Binomial {
    pub fn new() -> Self {
        Self
    }
}

impl Family for Binomial {
    fn name(&self) -> &'static str {
        "Binomial"
    }
    fn parameters(&self) -> &[&'static str] {
        &["mu"]
    }
    fn default_link(&self, param: &str) -> Result<Box<dyn Link>, BayesrError> {
        match param {
            "mu" => Ok(Box::new(LogitLink)),
            _ => Err(self.unknown_parameter(param)),
        }
    }

    fn loglik(&self, y: &Array1<f64>, params: &Parameters) -> Result<f64, BayesrError> {
        let mu = params.get_param(self.name(), "mu")?;
        let ll = Zip::from(y).and(mu).fold(0.0, |acc, &yi, &p| {
            let p = p.clamp(MIN_POSITIVE, 1.0 - MIN_POSITIVE);
            acc + yi * p.ln() + (1.0 - yi) * (1.0 - p).ln()
        });
        Ok(ll)
    }

    fn score(
        &self,
        id: &str,
        y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError> {
        match id {
            // logit link: dl/deta = y - p
            "mu" => {
                let mu = params.get_param(self.name(), "mu")?;
                Ok(y - mu)
            }
            _ => Err(self.unknown_parameter(id)),
        }
    }

    fn weights(
        &self,
        id: &str,
        _y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError> {
        match id {
            "mu" => {
                let mu = params.get_param(self.name(), "mu")?;
                Ok(mu.mapv(|p| (p * (1.0 - p)).max(MIN_WEIGHT)))
            }
            _ => Err(self.unknown_parameter(id)),
        }
    }
}

// Gamma Distribution
// Parameterization: mu = mean, sigma = coefficient of variation (sqrt(Var/mu^2))
// Shape alpha = 1/sigma^2, Scale theta = mu * sigma^2
#[derive(Debug, Clone, Copy, Default)]
pub struct Gamma;

impl Gamma {
    pub fn new() -> Self {
        Self
    }
}

impl Family for Gamma {
    fn name(&self) -> &'static str {
        "Gamma"
    }
    fn parameters(&self) -> &[&'static str] {
        &["mu", "sigma"]
    }
    fn default_link(&self, param: &str) -> Result<Box<dyn Link>, BayesrError> {
        match param {
            "mu" => Ok(Box::new(LogLink)),
            "sigma" => Ok(Box::new(LogLink)),
            _ => Err(self.unknown_parameter(param)),
        }
    }

    fn loglik(&self, y: &Array1<f64>, params: &Parameters) -> Result<f64, BayesrError> {
        // l = -alpha*log(theta) - log(Gamma(alpha)) + (alpha-1)*log(y) - y/theta
        let mu = params.get_param(self.name(), "mu")?;
        let sigma = params.get_param(self.name(), "sigma")?;
        let ll = Zip::from(y)
            .and(mu)
            .and(sigma)
            .fold(0.0, |acc, &yi, &m, &s| {
                let m = m.max(MIN_POSITIVE);
                let s2 = s.max(MIN_POSITIVE).powi(2);
                let alpha = 1.0 / s2;
                let theta = m * s2;
                acc - alpha * theta.ln() - ln_gamma(alpha) + (alpha - 1.0) * yi.ln() - yi / theta
            });
        Ok(ll)
    }

    fn score(
        &self,
        id: &str,
        y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError> {
        let mu = params.get_param(self.name(), "mu")?;
        let sigma = params.get_param(self.name(), "sigma")?;
        match id {
            // log link: dl/deta = (y - mu) / (mu * sigma^2)
            "mu" => Ok(Zip::from(y).and(mu).and(sigma).map_collect(|&yi, &m, &s| {
                let m = m.max(MIN_POSITIVE);
                (yi - m) / (m * s.max(MIN_POSITIVE).powi(2))
            })),
            // log link on sigma, alpha = sigma^-2:
            // dl/deta = (2/sigma^2) * [digamma(alpha) + 2*log(sigma) - log(y/mu) + y/mu - 1]
            "sigma" => {
                let alpha = sigma.mapv(|s| 1.0 / s.max(MIN_POSITIVE).powi(2));
                let psi_alpha = digamma_batch(&alpha);
                let mut out = Array1::zeros(y.len());
                Zip::from(&mut out)
                    .and(y)
                    .and(mu)
                    .and(sigma)
                    .and(&psi_alpha)
                    .for_each(|o, &yi, &m, &s, &psi| {
                        let m = m.max(MIN_POSITIVE);
                        let s = s.max(MIN_POSITIVE);
                        let ratio = yi / m;
                        *o = (2.0 / (s * s)) * (psi + 2.0 * s.ln() - ratio.ln() + ratio - 1.0);
                    });
                Ok(out)
            }
            _ => Err(self.unknown_parameter(id)),
        }
    }

    fn weights(
        &self,
        id: &str,
        _y: &Array1<f64>,
        params: &Parameters,
    ) -> Result<Array1<f64>, BayesrError> {
        let sigma = params.get_param(self.name(), "sigma")?;
        match id {
            "mu" => Ok(sigma.mapv(|s| 1.0 / s.max(MIN_POSITIVE).powi(2))),
            // I_eta = (d alpha/d eta)^2 * (trigamma(alpha) - 1/alpha) = 4*alpha^2*trigamma(alpha) - 4*alpha
            "sigma" => {
                let alpha = sigma.mapv(|s| 1.0 / s.max(MIN_POSITIVE).powi(2));
                let psi_prime = trigamma_batch(&alpha);
                Ok(Zip::from(&alpha).and(&psi_prime).map_collect(|&a, &t| {
                    (4.0 * a * a * t - 4.0 * a).abs().max(MIN_WEIGHT)
                }))
            }
            _ => Err(self.unknown_parameter(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn numeric_score<F: Family>(
        family: &F,
        id: &str,
        y: &Array1<f64>,
        eta: &Predictor,
        i: usize,
    ) -> f64 {
        let h = 1e-6;
        let mut up = eta.clone();
        up.get_mut(id).unwrap()[i] += h;
        let mut down = eta.clone();
        down.get_mut(id).unwrap()[i] -= h;
        let ll_up = family.loglik(y, &family.map2par(&up).unwrap()).unwrap();
        let ll_down = family.loglik(y, &family.map2par(&down).unwrap()).unwrap();
        (ll_up - ll_down) / (2.0 * h)
    }

    fn check_score_matches_loglik<F: Family>(family: &F, y: Array1<f64>, eta: Predictor) {
        for id in family.parameters() {
            let params = family.map2par(&eta).unwrap();
            let score = family.score(id, &y, &params).unwrap();
            for i in 0..y.len() {
                let numeric = numeric_score(family, id, &y, &eta, i);
                assert!(
                    (score[i] - numeric).abs() < 1e-4,
                    "{} score for {} at {}: analytic {} vs numeric {}",
                    family.name(),
                    id,
                    i,
                    score[i],
                    numeric
                );
            }
        }
    }

    #[test]
    fn test_gaussian_score_matches_loglik() {
        let y = array![1.0, -0.5, 2.5];
        let eta = Predictor::new()
            .with("mu", array![0.5, 0.0, 2.0])
            .with("sigma", array![0.1, -0.3, 0.0]);
        check_score_matches_loglik(&Gaussian, y, eta);
    }

    #[test]
    fn test_poisson_score_matches_loglik() {
        let y = array![0.0, 3.0, 7.0];
        let eta = Predictor::new().with("mu", array![0.2, 1.0, 1.8]);
        check_score_matches_loglik(&Poisson, y, eta);
    }

    #[test]
    fn test_binomial_score_matches_loglik() {
        let y = array![0.0, 1.0, 1.0];
        let eta = Predictor::new().with("mu", array![-1.0, 0.3, 2.0]);
        check_score_matches_loglik(&Binomial, y, eta);
    }

    #[test]
    fn test_gamma_score_matches_loglik() {
        let y = array![0.5, 1.5, 4.0];
        let eta = Predictor::new()
            .with("mu", array![0.0, 0.5, 1.0])
            .with("sigma", array![-0.5, -0.2, 0.1]);
        check_score_matches_loglik(&Gamma, y, eta);
    }

    #[test]
    fn test_gaussian_loglik_standard_normal() {
        let y = array![0.0];
        let params = Parameters::new()
            .with("mu", array![0.0])
            .with("sigma", array![1.0]);
        let ll = Gaussian.loglik(&y, &params).unwrap();
        assert!((ll + 0.5 * (2.0 * PI).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_weights_are_positive() {
        let y = array![0.0, 1.0];
        let params = Parameters::new().with("mu", array![0.0, 1.0]);
        let w = Binomial.weights("mu", &y, &params).unwrap();
        assert!(w.iter().all(|&v| v > 0.0));

        let w = Poisson.weights("mu", &y, &params).unwrap();
        assert!(w.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_map2par_applies_inverse_links() {
        let eta = Predictor::new()
            .with("mu", array![1.0])
            .with("sigma", array![0.0]);
        let params = Gaussian.map2par(&eta).unwrap();
        assert_eq!(params["mu"][0], 1.0);
        assert!((params["sigma"][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_map2par_missing_predictor() {
        let eta = Predictor::new().with("mu", array![1.0]);
        let result = Gaussian.map2par(&eta);
        assert!(matches!(result, Err(BayesrError::MissingPredictor { .. })));
    }

    #[test]
    fn test_unknown_parameter() {
        let y = array![1.0];
        let params = Parameters::new().with("mu", array![1.0]);
        let result = Poisson.score("sigma", &y, &params);
        assert!(matches!(result, Err(BayesrError::UnknownParameter { .. })));
    }

    #[test]
    fn test_links_invert_each_other() {
        let cases: [(&dyn Family, &str, f64); 4] = [
            (&Gaussian, "mu", -2.5),
            (&Gaussian, "sigma", 0.7),
            (&Poisson, "mu", 3.0),
            (&Binomial, "mu", 0.2),
        ];
        for (family, param, value) in cases {
            let link = family.default_link(param).unwrap();
            let back = link.inv_link(link.link(value));
            assert!(
                (back - value).abs() < 1e-12,
                "{} {}: {} -> {}",
                family.name(),
                param,
                value,
                back
            );
        }
    }
}
