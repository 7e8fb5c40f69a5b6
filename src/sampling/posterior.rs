use crate::error::BayesrError;
use crate::families::Family;
use crate::math::quad_form;
use crate::terms::Term;
use crate::types::{Coefficients, Predictor};
use ndarray::Array1;
use std::marker::PhantomData;

/// Log-posterior of a term's coefficients, as used by the slice sampler.
///
/// `eta` is the predictor of the current state: `eta[id]` still contains
/// `term.state.fit`, which an implementation has to swap for `X g`.
pub trait LogPosterior<F: Family + ?Sized> {
    fn log_post(
        &self,
        g: &Coefficients,
        term: &Term,
        family: &F,
        response: &Array1<f64>,
        eta: &Predictor,
        id: &str,
    ) -> Result<f64, BayesrError>;
}

/// Log-likelihood at `X g` plus the Gaussian smoothness prior `-0.5/tau2 g'Sg`.
///
/// The prior is dropped for fixed terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermLogPosterior;

impl<F: Family + ?Sized> LogPosterior<F> for TermLogPosterior {
    fn log_post(
        &self,
        g: &Coefficients,
        term: &Term,
        family: &F,
        response: &Array1<f64>,
        eta: &Predictor,
        id: &str,
    ) -> Result<f64, BayesrError> {
        let mut eta_g = eta.clone();
        eta_g.replace_fit(id, &term.state.fit, &term.x.fit(g))?;

        let params = family.map2par(&eta_g)?;
        let loglik = family.loglik(response, &params)?;

        let log_prior = match (&term.penalty, term.state.fixed) {
            (Some(s), false) => -0.5 / term.state.tau2 * quad_form(s, g),
            _ => 0.0,
        };
        Ok(loglik + log_prior)
    }
}

/// Adapter turning a closure into a [`LogPosterior`]. Build it with [`from_fn`].
pub struct FnLogPosterior<F: ?Sized, C> {
    f: C,
    _family: PhantomData<fn(&F)>,
}

/// Wraps a closure `|g, term, family, response, eta, id| -> Result<f64, _>`.
pub fn from_fn<F, C>(f: C) -> FnLogPosterior<F, C>
where
    F: Family + ?Sized,
    C: Fn(&Coefficients, &Term, &F, &Array1<f64>, &Predictor, &str) -> Result<f64, BayesrError>,
{
    FnLogPosterior {
        f,
        _family: PhantomData,
    }
}

impl<F, C> LogPosterior<F> for FnLogPosterior<F, C>
where
    F: Family + ?Sized,
    C: Fn(&Coefficients, &Term, &F, &Array1<f64>, &Predictor, &str) -> Result<f64, BayesrError>,
{
    fn log_post(
        &self,
        g: &Coefficients,
        term: &Term,
        family: &F,
        response: &Array1<f64>,
        eta: &Predictor,
        id: &str,
    ) -> Result<f64, BayesrError> {
        (self.f)(g, term, family, response, eta, id)
    }
}
