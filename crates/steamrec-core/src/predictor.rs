//! The capability shared by every predictor
//!
//! `fit` once, `predict` as often as needed, persist via [`crate::persist`].

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::RatingTable;

/// Outcome of a `predict` query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Prediction {
    /// Predicted affinity. Not clipped to the input rating range.
    Known(f64),
    /// The user or item was never seen during `fit`
    Unknown,
}

impl Prediction {
    /// The score, or `None` for a cold-start query
    pub fn score(self) -> Option<f64> {
        match self {
            Self::Known(score) => Some(score),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(score) => write!(f, "{:.4}", score),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Predictor variants, as tagged in persisted models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    UserKnn,
    ItemKnn,
    LatentFactor,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserKnn => "user_knn",
            Self::ItemKnn => "item_knn",
            Self::LatentFactor => "latent_factor",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "user_knn" => Some(Self::UserKnn),
            "item_knn" => Some(Self::ItemKnn),
            "latent_factor" => Some(Self::LatentFactor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal observations made while fitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Factorization stopped at the iteration budget before reaching tolerance.
    /// The partial factors are kept.
    ConvergenceWarning {
        iterations: usize,
        /// Final projected-gradient violation relative to the first sweep
        relative_violation: f64,
        tol: f64,
    },
    /// Fewer subjects than the configured neighbor count
    NeighborCountClamped { requested: usize, used: usize },
    /// More latent factors requested than min(users, items)
    LatentFactorsClamped { requested: usize, used: usize },
}

impl Diagnostic {
    pub fn is_convergence_warning(&self) -> bool {
        matches!(self, Self::ConvergenceWarning { .. })
    }
}

/// Summary returned by a successful `fit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub variant: Variant,
    /// Length of the axis neighbors are searched on (users for latent factor)
    pub subjects: usize,
    pub responses: usize,
    /// Number of observed ratings
    pub observed: usize,
    /// Solver sweeps; 0 for neighborhood models
    pub iterations: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl FitReport {
    pub fn converged(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_convergence_warning)
    }
}

/// A collaborative-filtering predictor.
///
/// `fit` replaces any previously fitted state. `predict` never fails:
/// identifiers unseen during `fit` yield [`Prediction::Unknown`], as does
/// every query against an unfitted predictor.
pub trait Predictor {
    /// Variant tag of this predictor
    fn variant(&self) -> Variant;

    /// Fit from a rating table, discarding prior state
    fn fit(&mut self, table: &RatingTable) -> Result<FitReport>;

    /// Predicted affinity of `user_id` for `item_id`
    fn predict(&self, user_id: &str, item_id: &str) -> Prediction;

    /// Whether `fit` (or `load`) has produced state
    fn is_fitted(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_score() {
        assert_eq!(Prediction::Known(2.5).score(), Some(2.5));
        assert_eq!(Prediction::Unknown.score(), None);
        assert!(Prediction::Unknown.is_unknown());
        assert_eq!(Prediction::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_variant_tags() {
        for variant in [Variant::UserKnn, Variant::ItemKnn, Variant::LatentFactor] {
            assert_eq!(Variant::parse(variant.as_str()), Some(variant));
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, format!("\"{}\"", variant));
        }
        assert_eq!(Variant::parse("svd"), None);
    }

    #[test]
    fn test_report_converged() {
        let mut report = FitReport {
            variant: Variant::LatentFactor,
            subjects: 2,
            responses: 2,
            observed: 4,
            iterations: 1,
            diagnostics: vec![Diagnostic::LatentFactorsClamped {
                requested: 20,
                used: 2,
            }],
        };
        assert!(report.converged());

        report.diagnostics.push(Diagnostic::ConvergenceWarning {
            iterations: 1,
            relative_violation: 0.5,
            tol: 1e-4,
        });
        assert!(!report.converged());
    }
}
