//! NeighborhoodPredictor - fit/predict over one orientation

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::index::CosineIndex;
use super::{NeighborhoodConfig, Orientation};
use crate::error::{RecommendError, Result};
use crate::logging::target;
use crate::matrix::{InteractionMatrix, Layout};
use crate::predictor::{Diagnostic, FitReport, Prediction, Predictor, Variant};
use crate::table::RatingTable;

/// Everything a fitted neighborhood model owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodState {
    pub(crate) config: NeighborhoodConfig,
    pub(crate) matrix: InteractionMatrix,
    #[serde(skip)]
    pub(crate) index: CosineIndex,
    /// Effective K after clamping to the subject count
    pub(crate) neighbor_count: usize,
}

impl NeighborhoodState {
    /// Check that the parts fit together
    pub(crate) fn validate(&self, layout: Layout) -> Result<()> {
        self.matrix.validate()?;
        let (subjects, _) = self.matrix.shape();
        if self.neighbor_count == 0 || self.neighbor_count > subjects {
            return Err(RecommendError::CorruptState(format!(
                "neighbor count {} outside 1..={}",
                self.neighbor_count, subjects
            )));
        }
        if self.matrix.layout() != layout {
            return Err(RecommendError::CorruptState(format!(
                "expected {:?} layout, found {:?}",
                layout,
                self.matrix.layout()
            )));
        }
        Ok(())
    }
}

/// A neighbor of a subject, by identifier
#[derive(Debug, Clone, PartialEq)]
pub struct RankedNeighbor<'a> {
    pub id: &'a str,
    pub distance: f64,
}

/// Cosine K-nearest-neighbor predictor, generic over orientation
#[derive(Debug, Clone)]
pub struct NeighborhoodPredictor<O: Orientation> {
    config: NeighborhoodConfig,
    state: Option<NeighborhoodState>,
    _orientation: PhantomData<O>,
}

impl<O: Orientation> Default for NeighborhoodPredictor<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Orientation> NeighborhoodPredictor<O> {
    /// Create an unfitted predictor with default configuration
    pub fn new() -> Self {
        Self::with_config(NeighborhoodConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: NeighborhoodConfig) -> Self {
        Self {
            config,
            state: None,
            _orientation: PhantomData,
        }
    }

    pub fn config(&self) -> &NeighborhoodConfig {
        &self.config
    }

    /// The fitted interaction matrix, rows = subjects
    pub fn matrix(&self) -> Option<&InteractionMatrix> {
        self.state.as_ref().map(|s| &s.matrix)
    }

    /// K actually used by `predict`
    pub fn neighbor_count(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.neighbor_count)
    }

    /// Ranked neighbors of a subject (user for user-based, item for
    /// item-based), nearest first. `None` if the subject is unknown.
    pub fn neighbors(&self, subject_id: &str) -> Option<Vec<RankedNeighbor<'_>>> {
        let state = self.state.as_ref()?;
        let subject = state.matrix.rows().position(subject_id)?;
        let ranked = state
            .index
            .kneighbors(state.matrix.values(), subject, state.neighbor_count)
            .into_iter()
            .filter_map(|n| {
                Some(RankedNeighbor {
                    id: state.matrix.rows().id(n.position)?,
                    distance: n.distance,
                })
            })
            .collect();
        Some(ranked)
    }

    pub(crate) fn state(&self) -> Option<&NeighborhoodState> {
        self.state.as_ref()
    }

    /// Restore a predictor from loaded state, rebuilding the neighbor index
    pub(crate) fn from_state(mut state: NeighborhoodState) -> Result<Self> {
        state.validate(O::LAYOUT)?;
        state.index = CosineIndex::build(state.matrix.values(), state.config.parallel_threshold);
        Ok(Self {
            config: state.config.clone(),
            state: Some(state),
            _orientation: PhantomData,
        })
    }
}

impl<O: Orientation> Predictor for NeighborhoodPredictor<O> {
    fn variant(&self) -> Variant {
        O::VARIANT
    }

    fn fit(&mut self, table: &RatingTable) -> Result<FitReport> {
        self.config.validate()?;
        self.state = None;

        let matrix = InteractionMatrix::build(table, O::LAYOUT)?;
        let (subjects, responses) = matrix.shape();
        let index = CosineIndex::build(matrix.values(), self.config.parallel_threshold);

        let mut diagnostics = Vec::new();
        let neighbor_count = self.config.neighbor_count.min(subjects);
        if neighbor_count < self.config.neighbor_count {
            warn!(
                target: target::FIT,
                variant = %O::VARIANT,
                requested = self.config.neighbor_count,
                subjects,
                "neighbor_count exceeds subject count, clamping"
            );
            diagnostics.push(Diagnostic::NeighborCountClamped {
                requested: self.config.neighbor_count,
                used: neighbor_count,
            });
        }

        debug!(
            target: target::FIT,
            variant = %O::VARIANT,
            subjects,
            responses,
            k = neighbor_count,
            "fitted neighborhood model"
        );

        self.state = Some(NeighborhoodState {
            config: self.config.clone(),
            matrix,
            index,
            neighbor_count,
        });

        Ok(FitReport {
            variant: O::VARIANT,
            subjects,
            responses,
            observed: table.len(),
            iterations: 0,
            diagnostics,
        })
    }

    fn predict(&self, user_id: &str, item_id: &str) -> Prediction {
        let Some(state) = &self.state else {
            return Prediction::Unknown;
        };
        let Some((subject, column)) = state.matrix.locate(user_id, item_id) else {
            return Prediction::Unknown;
        };

        let values = state.matrix.values();
        let neighbors = state.index.kneighbors(values, subject, state.neighbor_count);
        let total: f64 = neighbors.iter().map(|n| values[[n.position, column]]).sum();
        Prediction::Known(total / neighbors.len() as f64)
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighborhood::{ItemKnn, UserKnn};
    use crate::table::RatingRecord;
    use pretty_assertions::assert_eq;

    fn table(rows: &[(&str, &str, f64)]) -> RatingTable {
        rows.iter()
            .map(|&(u, i, r)| RatingRecord::new(u, i, r))
            .collect()
    }

    #[test]
    fn test_unfitted_predicts_unknown() {
        let model = UserKnn::new();
        assert!(!model.is_fitted());
        assert_eq!(model.predict("u1", "i1"), Prediction::Unknown);
    }

    #[test]
    fn test_user_based_mean_of_neighbors() {
        // u1 and u2 agree, u3 is orthogonal to both
        let data = table(&[
            ("u1", "i1", 5.0),
            ("u1", "i2", 4.0),
            ("u2", "i1", 5.0),
            ("u2", "i2", 4.0),
            ("u2", "i3", 2.0),
            ("u3", "i4", 1.0),
        ]);
        let mut model = UserKnn::with_config(NeighborhoodConfig::default().with_neighbor_count(2));
        model.fit(&data).unwrap();

        // neighbors of u1: u1 itself, then u2
        assert_eq!(model.predict("u1", "i3"), Prediction::Known(1.0));
        let ids: Vec<_> = model.neighbors("u1").unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
    }

    #[test]
    fn test_item_based_mean_of_neighbors() {
        let data = table(&[
            ("u1", "i1", 5.0),
            ("u2", "i1", 3.0),
            ("u1", "i2", 5.0),
            ("u2", "i2", 3.0),
            ("u3", "i3", 4.0),
        ]);
        let mut model = ItemKnn::with_config(NeighborhoodConfig::default().with_neighbor_count(2));
        let report = model.fit(&data).unwrap();
        assert_eq!(report.subjects, 3);
        assert_eq!(report.responses, 3);

        // i1's nearest items are i1 and i2; u1 rated both 5.0
        assert_eq!(model.predict("u1", "i1"), Prediction::Known(5.0));
        // u3 rated neither i1 nor i2
        assert_eq!(model.predict("u3", "i1"), Prediction::Known(0.0));
    }

    #[test]
    fn test_neighbor_count_clamped() {
        let data = table(&[("u1", "i1", 3.0), ("u2", "i1", 1.0)]);
        let mut model = UserKnn::new();
        let report = model.fit(&data).unwrap();
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::NeighborCountClamped {
                requested: 5,
                used: 2
            }]
        );
        assert_eq!(model.neighbor_count(), Some(2));
        assert_eq!(model.predict("u1", "i1"), Prediction::Known(2.0));
    }

    #[test]
    fn test_invalid_config_fails_fit() {
        let mut model = ItemKnn::with_config(NeighborhoodConfig::default().with_neighbor_count(0));
        let result = model.fit(&table(&[("u1", "i1", 3.0)]));
        assert!(matches!(result, Err(RecommendError::Config(_))));
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_refit_discards_previous_state() {
        let mut model = UserKnn::new();
        model.fit(&table(&[("u1", "i1", 3.0)])).unwrap();
        model.fit(&table(&[("u2", "i2", 4.0)])).unwrap();
        assert!(model.predict("u1", "i1").is_unknown());
        assert_eq!(model.predict("u2", "i2"), Prediction::Known(4.0));
    }

    #[test]
    fn test_failed_refit_leaves_model_unfitted() {
        let mut model = UserKnn::new();
        model.fit(&table(&[("u1", "i1", 3.0)])).unwrap();
        assert!(model.fit(&RatingTable::new()).is_err());
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_neighbors_of_unknown_subject() {
        let mut model = ItemKnn::new();
        model.fit(&table(&[("u1", "i1", 3.0)])).unwrap();
        assert!(model.neighbors("i9").is_none());
        assert!(model.neighbors("i1").is_some());
    }
}
