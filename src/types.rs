use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use crate::error::BayesrError;

// ----- Newtypes for Safety (Vectors)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Coefficients(pub Array1<f64>);

impl Coefficients {
    pub fn zeros(k: usize) -> Self {
        Self(Array1::zeros(k))
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Self(Array1::from_vec(values))
    }
}

impl Deref for Coefficients {
    type Target = Array1<f64>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Coefficients {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Array1<f64>> for Coefficients {
    fn from(arr: Array1<f64>) -> Self {
        Self(arr)
    }
}

// ----- Newtypes for Safety (Matrices)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ModelMatrix(pub Array2<f64>);

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PenaltyMatrix(pub Array2<f64>);

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PrecisionMatrix(pub Array2<f64>);

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CovarianceMatrix(pub Array2<f64>);

macro_rules! impl_deref_for_matrix_wrapper {
    ($t:ty) => {
        impl Deref for $t {
            type Target = Array2<f64>;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl DerefMut for $t {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}

impl_deref_for_matrix_wrapper!(ModelMatrix);
impl_deref_for_matrix_wrapper!(PenaltyMatrix);
impl_deref_for_matrix_wrapper!(PrecisionMatrix);
impl_deref_for_matrix_wrapper!(CovarianceMatrix);

impl ModelMatrix {
    pub fn n_obs(&self) -> usize {
        self.0.nrows()
    }

    pub fn n_coeffs(&self) -> usize {
        self.0.ncols()
    }

    /// Fitted contribution X * g of a coefficient vector.
    pub fn fit(&self, g: &Coefficients) -> Array1<f64> {
        self.0.dot(&g.0)
    }
}

// ----- Named vectors: linear predictors and natural parameters

macro_rules! impl_named_vectors {
    ($t:ident) => {
        impl $t {
            pub fn new() -> Self {
                Self(HashMap::new())
            }

            pub fn with(mut self, name: impl Into<String>, values: Array1<f64>) -> Self {
                self.0.insert(name.into(), values);
                self
            }

            pub fn insert(&mut self, name: impl Into<String>, values: Array1<f64>) {
                self.0.insert(name.into(), values);
            }
        }

        impl Deref for $t {
            type Target = HashMap<String, Array1<f64>>;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $t {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<HashMap<String, Array1<f64>>> for $t {
            fn from(map: HashMap<String, Array1<f64>>) -> Self {
                Self(map)
            }
        }
    };
}

/// Linear predictors keyed by distribution parameter (`"mu"`, `"sigma"`, ...).
///
/// `eta[id]` always holds the sum of every term's fitted contribution to that
/// parameter, including the term currently being updated.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Predictor(pub HashMap<String, Array1<f64>>);

/// Distribution parameters on their natural scale, as produced by `Family::map2par`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Parameters(pub HashMap<String, Array1<f64>>);

impl_named_vectors!(Predictor);
impl_named_vectors!(Parameters);

impl Predictor {
    pub fn get_term(&self, id: &str) -> Result<&Array1<f64>, BayesrError> {
        self.0.get(id).ok_or_else(|| BayesrError::MissingPredictor {
            id: id.to_string(),
        })
    }

    /// Swaps one term's contribution to `eta[id]`: subtracts `old_fit`, adds `new_fit`.
    pub fn replace_fit(
        &mut self,
        id: &str,
        old_fit: &Array1<f64>,
        new_fit: &Array1<f64>,
    ) -> Result<(), BayesrError> {
        let eta = self.0.get_mut(id).ok_or_else(|| BayesrError::MissingPredictor {
            id: id.to_string(),
        })?;
        if old_fit.len() != eta.len() || new_fit.len() != eta.len() {
            return Err(BayesrError::DimensionMismatch {
                what: format!("fitted values for '{}'", id),
                expected: eta.len(),
                found: old_fit.len().max(new_fit.len()),
            });
        }
        *eta -= old_fit;
        *eta += new_fit;
        Ok(())
    }
}

impl Parameters {
    pub fn get_param(&self, family: &str, name: &str) -> Result<&Array1<f64>, BayesrError> {
        self.0.get(name).ok_or_else(|| BayesrError::UnknownParameter {
            family: family.to_string(),
            param: name.to_string(),
        })
    }
}
