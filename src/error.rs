use ndarray::ShapeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BayesrError {
    #[cfg(feature = "openblas")]
    #[error("Linear algebra error: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[cfg(not(feature = "openblas"))]
    #[error("Linear algebra error: {0}")]
    Linalg(String),

    #[error("Array shape error: {0}")]
    Shape(String),

    #[error("{what}: expected length {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    #[error("No linear predictor found for '{id}'")]
    MissingPredictor { id: String },

    #[error("Unknown parameter '{param}' for family {family}")]
    UnknownParameter { family: String, param: String },

    #[error("Family weight for '{id}' at observation {index} is not positive: {value}")]
    NonPositiveWeight { id: String, index: usize, value: f64 },

    #[error("{what} contains {count} non-finite values")]
    NonFiniteValues { what: String, count: usize },

    #[error("Term is not fixed but has no penalty matrix")]
    MissingPenalty,

    #[error("Smoothing variance must be positive and finite, got {0}")]
    InvalidTau2(f64),

    #[error("Invalid slice sampler configuration: {0}")]
    InvalidSliceConfig(String),

    #[error("Coordinate value {value} lies outside [{lower}, {upper}]")]
    OutOfBounds { value: f64, lower: f64, upper: f64 },

    #[error("Slice shrinkage did not find a point inside the slice after {iterations} draws")]
    SliceShrinkageExhausted { iterations: usize },

    #[error("Invalid input: {0}")]
    Input(String),
}

impl From<ShapeError> for BayesrError {
    fn from(err: ShapeError) -> Self {
        BayesrError::Shape(err.to_string())
    }
}
