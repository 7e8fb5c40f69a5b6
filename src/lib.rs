//! IWLS Metropolis-Hastings proposals and univariate slice sampling for the
//! terms of Bayesian structured additive distributional regression models.
//!
//! A driver keeps one [`Term`] per additive component and a [`Predictor`]
//! holding the summed linear predictor of every distribution parameter. Each
//! update draws either a [`Proposal`] via [`propose`] or new coefficients via
//! [`uni_slice`]; neither modifies the caller's state.

#[cfg(not(any(feature = "openblas", feature = "pure-rust")))]
compile_error!("enable one of the `openblas` or `pure-rust` features");

mod error;
pub mod families;
pub mod linalg;
mod math;
pub mod preprocessing;
pub mod sampling;
mod terms;
mod types;

pub use error::BayesrError;
pub use families::{Binomial, Family, Gamma, Gaussian, Link, Poisson};
pub use sampling::{
    from_fn, propose, slice_sweep, uni_slice, LogPosterior, Proposal, SliceConfig,
    TermLogPosterior,
};
pub use terms::{Term, TermState, VariancePrior};
pub use types::*;
