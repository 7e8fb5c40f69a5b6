#![allow(dead_code)]

use bayesr_rs::{linalg, Coefficients, ModelMatrix, PenaltyMatrix, Predictor, Proposal, Term};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_distr::{Bernoulli, Distribution, Normal, Poisson};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Generator {
    pub rng: StdRng,
}

impl Generator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn covariate(n: usize) -> Array1<f64> {
        Array1::from_shape_fn(n, |i| i as f64 / n as f64)
    }

    pub fn linear_gaussian(
        &mut self,
        n: usize,
        intercept: f64,
        slope: f64,
        sigma: f64,
    ) -> (Array1<f64>, ModelMatrix) {
        let x = Self::covariate(n);
        let y = x.mapv(|x_val| {
            let dist = Normal::new(intercept + slope * x_val, sigma).unwrap();
            dist.sample(&mut self.rng)
        });
        (y, line_design(&x))
    }

    pub fn poisson_data(&mut self, n: usize, intercept: f64, slope: f64) -> (Array1<f64>, ModelMatrix) {
        let x = Self::covariate(n);
        let y = x.mapv(|x_val| {
            let mu = (intercept + slope * x_val).exp();
            let dist = Poisson::new(mu).unwrap();
            dist.sample(&mut self.rng)
        });
        (y, line_design(&x))
    }

    pub fn bernoulli_data(&mut self, n: usize, intercept: f64, slope: f64) -> (Array1<f64>, ModelMatrix) {
        let x = Self::covariate(n);
        let y = x.mapv(|x_val| {
            let p = 1.0 / (1.0 + (-(intercept + slope * x_val)).exp());
            let dist = Bernoulli::new(p).unwrap();
            if dist.sample(&mut self.rng) {
                1.0
            } else {
                0.0
            }
        });
        (y, line_design(&x))
    }

    /// Noisy sine curve on [0, 1) for smooth terms.
    pub fn wiggly_gaussian(&mut self, n: usize, sigma: f64) -> (Array1<f64>, Array1<f64>) {
        let x = Self::covariate(n);
        let y = x.mapv(|x_val| {
            let dist = Normal::new((2.0 * std::f64::consts::PI * x_val).sin(), sigma).unwrap();
            dist.sample(&mut self.rng)
        });
        (y, x)
    }
}

/// Intercept and slope columns.
pub fn line_design(x: &Array1<f64>) -> ModelMatrix {
    ModelMatrix(Array2::from_shape_fn((x.len(), 2), |(i, j)| {
        if j == 0 {
            1.0
        } else {
            x[i]
        }
    }))
}

/// Gaussian bumps with evenly spaced centres, a stand-in for a spline basis.
pub fn bump_design(x: &Array1<f64>, k: usize) -> ModelMatrix {
    let h = 1.0 / (k as f64 - 1.0);
    ModelMatrix(Array2::from_shape_fn((x.len(), k), |(i, j)| {
        let d = (x[i] - j as f64 * h) / h;
        (-0.5 * d * d).exp()
    }))
}

/// `D'D` for the difference matrix `D` of the given order.
pub fn difference_penalty(k: usize, order: usize) -> PenaltyMatrix {
    let mut d = Array2::<f64>::eye(k);
    for _ in 0..order {
        let rows = d.nrows() - 1;
        d = Array2::from_shape_fn((rows, k), |(i, j)| d[[i + 1, j]] - d[[i, j]]);
    }
    PenaltyMatrix(d.t().dot(&d))
}

/// `(X'X)^-1 X'z`, used to start chains near the data.
pub fn least_squares(x: &ModelMatrix, z: &Array1<f64>) -> Coefficients {
    let xtx = x.t().dot(&x.0);
    let u = linalg::cholesky_upper(&xtx).unwrap();
    let xtx_inv = linalg::inv_from_cholesky_upper(&u).unwrap();
    Coefficients(xtx_inv.dot(&x.t().dot(z)))
}

/// Plain Metropolis-Hastings acceptance step as a driver would run it.
pub fn mh_step<R: Rng>(
    term: &mut Term,
    eta: &mut Predictor,
    id: &str,
    proposal: &Proposal,
    rng: &mut R,
) -> bool {
    let u: f64 = rng.random();
    if u.ln() < proposal.log_accept_ratio {
        eta.replace_fit(id, &term.state.fit, &proposal.fit).unwrap();
        term.state = term.state.accept(proposal);
        true
    } else {
        false
    }
}
