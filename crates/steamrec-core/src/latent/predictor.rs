use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::nmf::{factorize, reconstruction_error, NmfParams};
use super::LatentFactorConfig;
use crate::error::{InputError, RecommendError, Result};
use crate::logging::target;
use crate::matrix::{InteractionMatrix, Layout};
use crate::predictor::{Diagnostic, FitReport, Prediction, Predictor, Variant};
use crate::table::RatingTable;

/// Everything a fitted latent-factor model owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentFactorState {
    pub(crate) config: LatentFactorConfig,
    pub(crate) matrix: InteractionMatrix,
    /// users × r
    pub(crate) w: Array2<f64>,
    /// r × items
    pub(crate) h: Array2<f64>,
    pub(crate) iterations: usize,
    pub(crate) reconstruction_err: f64,
}

impl LatentFactorState {
    pub(crate) fn validate(&self) -> Result<()> {
        self.matrix.validate()?;
        if self.matrix.layout() != Layout::UserRows {
            return Err(RecommendError::CorruptState(
                "latent factor matrix must have users as rows".into(),
            ));
        }
        let (users, items) = self.matrix.shape();
        let (w_rows, rank) = self.w.dim();
        let (h_rows, h_cols) = self.h.dim();
        if w_rows != users || h_cols != items || h_rows != rank || rank == 0 {
            return Err(RecommendError::CorruptState(format!(
                "factor shapes W {}x{}, H {}x{} do not fit a {}x{} matrix",
                w_rows, rank, h_rows, h_cols, users, items
            )));
        }
        for (name, factor) in [("W", &self.w), ("H", &self.h)] {
            if let Some(value) = factor.iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(RecommendError::CorruptState(format!(
                    "factor {} holds {}, expected finite and non-negative",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Non-negative matrix factorization predictor
#[derive(Debug, Clone, Default)]
pub struct LatentFactorPredictor {
    config: LatentFactorConfig,
    state: Option<LatentFactorState>,
}

impl LatentFactorPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LatentFactorConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &LatentFactorConfig {
        &self.config
    }

    pub fn matrix(&self) -> Option<&InteractionMatrix> {
        self.state.as_ref().map(|s| &s.matrix)
    }

    /// Fitted (W, H)
    pub fn factors(&self) -> Option<(&Array2<f64>, &Array2<f64>)> {
        self.state.as_ref().map(|s| (&s.w, &s.h))
    }

    /// ‖X − WH‖_F at the end of fitting
    pub fn reconstruction_error(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.reconstruction_err)
    }

    /// Rank actually used
    pub fn latent_factors(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.w.ncols())
    }

    pub(crate) fn state(&self) -> Option<&LatentFactorState> {
        self.state.as_ref()
    }

    pub(crate) fn from_state(state: LatentFactorState) -> Result<Self> {
        state.validate()?;
        Ok(Self {
            config: state.config.clone(),
            state: Some(state),
        })
    }
}

impl Predictor for LatentFactorPredictor {
    fn variant(&self) -> Variant {
        Variant::LatentFactor
    }

    fn fit(&mut self, table: &RatingTable) -> Result<FitReport> {
        self.config.validate()?;
        self.state = None;

        let matrix = InteractionMatrix::build(table, Layout::UserRows)?;
        if let Some(record) = table.iter().find(|r| r.rating < 0.0) {
            return Err(InputError::NegativeRating {
                user_id: record.user_id.to_string(),
                item_id: record.item_id.to_string(),
                rating: record.rating,
            }
            .into());
        }

        let (users, items) = matrix.shape();
        let mut diagnostics = Vec::new();

        let rank = self.config.latent_factors.min(users.min(items));
        if rank < self.config.latent_factors {
            warn!(
                target: target::FIT,
                requested = self.config.latent_factors,
                used = rank,
                "latent_factors exceeds min(users, items), clamping"
            );
            diagnostics.push(Diagnostic::LatentFactorsClamped {
                requested: self.config.latent_factors,
                used: rank,
            });
        }

        let params = NmfParams {
            n_components: rank,
            seed: self.config.seed,
            max_iter: self.config.max_iter,
            tol: self.config.tol,
        };
        let result = factorize(matrix.values(), &params);
        let reconstruction_err = reconstruction_error(matrix.values(), &result.w, &result.h);

        if !result.converged {
            warn!(
                target: target::FIT,
                iterations = result.iterations,
                relative_violation = result.relative_violation,
                tol = self.config.tol,
                "factorization did not converge, keeping partial factors; increase max_iter to improve the fit"
            );
            diagnostics.push(Diagnostic::ConvergenceWarning {
                iterations: result.iterations,
                relative_violation: result.relative_violation,
                tol: self.config.tol,
            });
        }

        debug!(
            target: target::FIT,
            users,
            items,
            rank,
            iterations = result.iterations,
            reconstruction_err,
            "fitted latent factor model"
        );

        let iterations = result.iterations;
        self.state = Some(LatentFactorState {
            config: self.config.clone(),
            matrix,
            w: result.w,
            h: result.h,
            iterations,
            reconstruction_err,
        });

        Ok(FitReport {
            variant: Variant::LatentFactor,
            subjects: users,
            responses: items,
            observed: table.len(),
            iterations,
            diagnostics,
        })
    }

    fn predict(&self, user_id: &str, item_id: &str) -> Prediction {
        let Some(state) = &self.state else {
            return Prediction::Unknown;
        };
        match state.matrix.locate(user_id, item_id) {
            Some((user, item)) => Prediction::Known(state.w.row(user).dot(&state.h.column(item))),
            None => Prediction::Unknown,
        }
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}
