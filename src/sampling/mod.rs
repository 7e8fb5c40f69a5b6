pub mod posterior;
pub mod proposal;
pub mod slice;
mod system;
mod variates;

pub use posterior::{from_fn, FnLogPosterior, LogPosterior, TermLogPosterior};
pub use proposal::propose;
pub use slice::{slice_sweep, uni_slice, SliceConfig};

use crate::types::Coefficients;
use ndarray::Array1;

/// Outcome of one IWLS proposal.
///
/// The driver accepts with probability `min(1, exp(log_accept_ratio))`, e.g.
/// via [`TermState::accept`](crate::TermState::accept).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Proposal {
    pub g: Coefficients,
    /// `X g` of the proposed coefficients.
    pub fit: Array1<f64>,
    /// Redrawn smoothing variance, or the current one if it is not updated.
    pub tau2: f64,
    pub log_accept_ratio: f64,
}

impl Proposal {
    /// Acceptance probability `min(1, exp(log alpha))`.
    pub fn acceptance_probability(&self) -> f64 {
        if self.log_accept_ratio.is_nan() {
            0.0
        } else {
            self.log_accept_ratio.min(0.0).exp()
        }
    }
}
