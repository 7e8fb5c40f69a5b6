use super::posterior::LogPosterior;
use super::variates::{sample_exp1, sample_uniform};
use crate::error::BayesrError;
use crate::families::Family;
use crate::preprocessing::validate_inputs;
use crate::terms::Term;
use crate::types::{Coefficients, Predictor};
use log::{debug, trace};
use ndarray::Array1;
use rand::Rng;

const DEFAULT_STEP_WIDTH: f64 = 1.0;
const DEFAULT_MAX_STEPS: usize = 100;
const DEFAULT_MAX_SHRINK_ITERATIONS: usize = 10_000;

/// Settings of the stepping-out and shrinkage slice sampler.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceConfig {
    /// Width `w` of the initial interval and of each stepping-out step.
    pub step_width: f64,
    /// Maximum number of stepping-out steps, split randomly between both ends.
    pub max_steps: usize,
    pub lower: f64,
    pub upper: f64,
    /// Cap on shrinkage draws. `None` loops until a point inside the slice is found.
    pub max_shrink_iterations: Option<usize>,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            step_width: DEFAULT_STEP_WIDTH,
            max_steps: DEFAULT_MAX_STEPS,
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            max_shrink_iterations: Some(DEFAULT_MAX_SHRINK_ITERATIONS),
        }
    }
}

impl SliceConfig {
    pub fn with_step_width(mut self, step_width: f64) -> Self {
        self.step_width = step_width;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_max_shrink_iterations(mut self, cap: Option<usize>) -> Self {
        self.max_shrink_iterations = cap;
        self
    }

    fn validate(&self) -> Result<(), BayesrError> {
        if !(self.step_width.is_finite() && self.step_width > 0.0) {
            return Err(BayesrError::InvalidSliceConfig(format!(
                "step width must be positive and finite, got {}",
                self.step_width
            )));
        }
        if self.lower.is_nan() || self.upper.is_nan() || self.lower > self.upper {
            return Err(BayesrError::InvalidSliceConfig(format!(
                "invalid bounds [{}, {}]",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

/// Resamples coordinate `j` (1-based) of `g` by univariate slice sampling.
///
/// Implements stepping out followed by shrinkage (Neal, 2003). A slice height
/// `log y = logPost(g) - Exp(1)` is drawn, an interval of width `w` is placed
/// randomly around `g[j]` and stepped out at most `max_steps` times in total,
/// clamped to `[lower, upper]`, and then shrunk towards `g[j]` until a draw
/// lands inside the slice. All other coordinates are returned unchanged.
#[allow(clippy::too_many_arguments)]
pub fn uni_slice<F, L, R>(
    g: &Coefficients,
    term: &Term,
    family: &F,
    response: &Array1<f64>,
    eta: &Predictor,
    id: &str,
    j: usize,
    config: &SliceConfig,
    log_post: &L,
    rng: &mut R,
) -> Result<Coefficients, BayesrError>
where
    F: Family + ?Sized,
    L: LogPosterior<F> + ?Sized,
    R: Rng + ?Sized,
{
    validate_inputs(term, response, eta, id)?;
    config.validate()?;

    let k = term.n_coeffs();
    if g.len() != k {
        return Err(BayesrError::DimensionMismatch {
            what: "slice coefficients".to_string(),
            expected: k,
            found: g.len(),
        });
    }
    if j == 0 || j > k {
        return Err(BayesrError::Input(format!(
            "coordinate index {} out of range 1..={}",
            j, k
        )));
    }
    let jj = j - 1;
    let w = config.step_width;
    let (lower, upper) = (config.lower, config.upper);

    let mut current = g.clone();
    let x0 = current[jj];
    if !(lower..=upper).contains(&x0) {
        return Err(BayesrError::OutOfBounds {
            value: x0,
            lower,
            upper,
        });
    }

    let eval = |point: &Coefficients| log_post.log_post(point, term, family, response, eta, id);

    let gx0 = eval(&current)?;
    if gx0.is_nan() {
        return Err(BayesrError::Input(
            "log-posterior at the current point is NaN".to_string(),
        ));
    }
    let logy = gx0 - sample_exp1(rng);

    let u = sample_uniform(0.0, w, rng);
    let mut left = x0 - u;
    let mut right = x0 + (w - u);

    let m = config.max_steps.saturating_add(1);
    if m > 1 {
        let mut steps_left = (sample_uniform(0.0, m as f64, rng).floor() as usize).min(m - 1);
        let mut steps_right = (m - 1) - steps_left;
        let mut probe = current.clone();

        while steps_left > 0 {
            if left <= lower {
                break;
            }
            probe[jj] = left;
            if eval(&probe)? <= logy {
                break;
            }
            left -= w;
            steps_left -= 1;
        }

        while steps_right > 0 {
            if right >= upper {
                break;
            }
            probe[jj] = right;
            if eval(&probe)? <= logy {
                break;
            }
            right += w;
            steps_right -= 1;
        }
    }

    left = left.max(lower);
    right = right.min(upper);
    trace!("slice interval for coordinate {}: [{}, {}]", j, left, right);

    let mut iterations = 0;
    loop {
        if let Some(cap) = config.max_shrink_iterations {
            if iterations >= cap {
                return Err(BayesrError::SliceShrinkageExhausted { iterations });
            }
        }
        iterations += 1;

        let x1 = sample_uniform(left, right, rng);
        current[jj] = x1;

        if eval(&current)? >= logy {
            debug!(
                "slice update of coordinate {} for '{}': {} -> {} after {} draws",
                j, id, x0, x1, iterations
            );
            return Ok(current);
        }

        if x1 > x0 {
            right = x1;
        } else {
            left = x1;
        }
    }
}

/// Slice-samples every coordinate of `term.state.g` in turn.
#[allow(clippy::too_many_arguments)]
pub fn slice_sweep<F, L, R>(
    term: &Term,
    family: &F,
    response: &Array1<f64>,
    eta: &Predictor,
    id: &str,
    config: &SliceConfig,
    log_post: &L,
    rng: &mut R,
) -> Result<Coefficients, BayesrError>
where
    F: Family + ?Sized,
    L: LogPosterior<F> + ?Sized,
    R: Rng + ?Sized,
{
    let mut g = term.state.g.clone();
    for j in 1..=g.len() {
        g = uni_slice(&g, term, family, response, eta, id, j, config, log_post, rng)?;
    }
    Ok(g)
}
