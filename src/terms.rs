use crate::sampling::Proposal;
use crate::types::{Coefficients, ModelMatrix, PenaltyMatrix};
use ndarray::Array1;

/// Inverse-gamma hyperparameters for a term's smoothing variance.
///
/// `rank` is used as the shape of the conjugate draw (usually the rank of the
/// penalty matrix, possibly shifted by a prior shape), `b` is the prior scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariancePrior {
    pub rank: f64,
    pub b: f64,
}

impl Default for VariancePrior {
    fn default() -> Self {
        Self {
            rank: 1.0,
            b: 0.0001,
        }
    }
}

/// Mutable sampling state of a term. The samplers never modify it in place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TermState {
    pub g: Coefficients,
    pub fit: Array1<f64>,
    pub tau2: f64,
    // no penalty and no tau2 update
    pub fixed: bool,
    // fixed smoothing parameter, tau2 is never redrawn
    pub fxsp: bool,
}

impl TermState {
    pub fn new(g: Coefficients, fit: Array1<f64>, tau2: f64) -> Self {
        Self {
            g,
            fit,
            tau2,
            fixed: false,
            fxsp: false,
        }
    }

    /// State with `fit = X g`.
    pub fn from_coefficients(x: &ModelMatrix, g: Coefficients, tau2: f64) -> Self {
        let fit = x.fit(&g);
        Self::new(g, fit, tau2)
    }

    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    pub fn fxsp(mut self, fxsp: bool) -> Self {
        self.fxsp = fxsp;
        self
    }

    pub fn with_tau2(&self, tau2: f64) -> Self {
        Self {
            tau2,
            ..self.clone()
        }
    }

    pub fn with_coefficients(&self, x: &ModelMatrix, g: Coefficients) -> Self {
        Self {
            fit: x.fit(&g),
            g,
            ..self.clone()
        }
    }

    /// New state after the driver accepted `proposal`.
    pub fn accept(&self, proposal: &Proposal) -> Self {
        Self {
            g: proposal.g.clone(),
            fit: proposal.fit.clone(),
            tau2: proposal.tau2,
            fixed: self.fixed,
            fxsp: self.fxsp,
        }
    }
}

/// One additive component of a structured predictor.
#[derive(Debug, Clone)]
pub struct Term {
    pub x: ModelMatrix,
    // absent for fixed (unpenalized) terms
    pub penalty: Option<PenaltyMatrix>,
    pub prior: VariancePrior,
    pub state: TermState,
}

impl Term {
    /// Unpenalized term, e.g. intercept and linear effects.
    pub fn fixed(x: ModelMatrix, state: TermState) -> Self {
        Self {
            x,
            penalty: None,
            prior: VariancePrior::default(),
            state: state.fixed(true),
        }
    }

    /// Penalized term with smoothing variance `state.tau2`.
    pub fn smooth(
        x: ModelMatrix,
        penalty: PenaltyMatrix,
        prior: VariancePrior,
        state: TermState,
    ) -> Self {
        Self {
            x,
            penalty: Some(penalty),
            prior,
            state: state.fixed(false),
        }
    }

    pub fn n_obs(&self) -> usize {
        self.x.n_obs()
    }

    pub fn n_coeffs(&self) -> usize {
        self.x.n_coeffs()
    }

    /// Same design, penalty and prior with a replacement state.
    pub fn with_state(&self, state: TermState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}
