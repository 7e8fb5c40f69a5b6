use crate::error::BayesrError;
use crate::terms::Term;
use crate::types::Predictor;
use ndarray::{Array1, Array2};

/// Checks that a term, the response and the predictor agree on dimensions.
pub fn validate_inputs(
    term: &Term,
    response: &Array1<f64>,
    eta: &Predictor,
    id: &str,
) -> Result<(), BayesrError> {
    let n = term.n_obs();
    let k = term.n_coeffs();

    if n == 0 || k == 0 {
        return Err(BayesrError::Input(format!(
            "design matrix must be non-empty, got {}x{}",
            n, k
        )));
    }

    check_len("response", n, response.len())?;
    check_len("coefficients", k, term.state.g.len())?;
    check_len("fitted values", n, term.state.fit.len())?;

    validate_finite("response", response)?;
    validate_finite("coefficients", &term.state.g)?;

    let tau2 = term.state.tau2;
    if !(tau2.is_finite() && tau2 > 0.0) {
        return Err(BayesrError::InvalidTau2(tau2));
    }

    if !term.state.fixed {
        let penalty = term.penalty.as_ref().ok_or(BayesrError::MissingPenalty)?;
        check_square("penalty matrix", k, penalty)?;
    }

    validate_predictor(eta, id, n)
}

/// Every entry of the predictor must have length `n`, and `id` must be present.
pub fn validate_predictor(eta: &Predictor, id: &str, n: usize) -> Result<(), BayesrError> {
    eta.get_term(id)?;
    for (name, values) in eta.iter() {
        check_len(&format!("linear predictor '{}'", name), n, values.len())?;
    }
    Ok(())
}

/// Weights from a family callback must have length `n` and be strictly positive.
pub fn validate_weights(weights: &Array1<f64>, id: &str, n: usize) -> Result<(), BayesrError> {
    check_len(&format!("weights for '{}'", id), n, weights.len())?;
    if let Some((index, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !(w.is_finite() && **w > 0.0))
    {
        return Err(BayesrError::NonPositiveWeight {
            id: id.to_string(),
            index,
            value,
        });
    }
    Ok(())
}

pub fn validate_score(score: &Array1<f64>, id: &str, n: usize) -> Result<(), BayesrError> {
    check_len(&format!("score for '{}'", id), n, score.len())?;
    validate_finite(&format!("score for '{}'", id), score)
}

fn validate_finite(what: &str, values: &Array1<f64>) -> Result<(), BayesrError> {
    let non_finite_count = values.iter().filter(|v| !v.is_finite()).count();
    if non_finite_count > 0 {
        return Err(BayesrError::NonFiniteValues {
            what: what.to_string(),
            count: non_finite_count,
        });
    }
    Ok(())
}

fn check_len(what: &str, expected: usize, found: usize) -> Result<(), BayesrError> {
    if expected != found {
        return Err(BayesrError::DimensionMismatch {
            what: what.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

fn check_square(what: &str, k: usize, m: &Array2<f64>) -> Result<(), BayesrError> {
    check_len(&format!("{} rows", what), k, m.nrows())?;
    check_len(&format!("{} columns", what), k, m.ncols())
}
