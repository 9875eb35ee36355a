//! Latent-factor collaborative filtering
//!
//! The user × item matrix (missing ratings = 0) is factorized into
//! non-negative W (users × r) and H (r × items); a prediction is the inner
//! product of the user's row of W and the item's column of H. Predictions
//! are not clipped and may exceed the input rating range.
//!
//! Fitting is deterministic for a given `seed`. Running out of iterations is
//! not an error: the partial factors are kept and the fit report carries a
//! [`Diagnostic::ConvergenceWarning`](crate::Diagnostic::ConvergenceWarning).

mod nmf;
mod predictor;

use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};

pub use nmf::{factorize, reconstruction_error, Factorization, NmfParams};
pub use predictor::{LatentFactorPredictor, LatentFactorState};

/// Latent-factor predictor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentFactorConfig {
    /// Rank r of the factorization. Clamped to min(users, items) at fit time.
    pub latent_factors: usize,
    /// Seed for the factor initialization
    pub seed: u64,
    /// Maximum number of W/H sweeps
    pub max_iter: usize,
    /// Relative projected-gradient tolerance
    pub tol: f64,
}

impl Default for LatentFactorConfig {
    fn default() -> Self {
        Self {
            latent_factors: 20,
            seed: 42,
            max_iter: 200,
            tol: 1e-4,
        }
    }
}

impl LatentFactorConfig {
    pub fn with_latent_factors(mut self, latent_factors: usize) -> Self {
        self.latent_factors = latent_factors;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.latent_factors == 0 {
            return Err(RecommendError::Config(
                "latent_factors must be at least 1".into(),
            ));
        }
        if self.max_iter == 0 {
            return Err(RecommendError::Config("max_iter must be at least 1".into()));
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(RecommendError::Config(format!(
                "tol must be finite and non-negative, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}
