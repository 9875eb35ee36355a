//! Nearest-neighbor collaborative filtering
//!
//! One algorithm, two orientations:
//!
//! - **User-based** ([`UserKnn`]): rows are users, a prediction averages what
//!   the K most similar users gave the item.
//! - **Item-based** ([`ItemKnn`]): rows are items, a prediction averages what
//!   the user gave the K items most similar to the target.
//!
//! Similarity is cosine over the dense rows (missing ratings are 0). The
//! queried row is its own nearest neighbor unless it is the zero vector, and
//! equidistant rows are ranked by their position in the matrix.
//!
//! Shifting every rating by a constant changes cosine directions, so
//! predictions are not invariant under additive shifts.
//!
//! # Example
//!
//! ```rust
//! use steamrec_core::neighborhood::UserKnn;
//! use steamrec_core::{Predictor, RatingRecord, RatingTable};
//!
//! let table = RatingTable::from_records(vec![
//!     RatingRecord::new("alice", "portal", 5.0),
//!     RatingRecord::new("bob", "portal", 4.0),
//!     RatingRecord::new("bob", "dota", 1.0),
//! ]);
//!
//! let mut model = UserKnn::default();
//! model.fit(&table).unwrap();
//! assert!(model.predict("alice", "dota").score().is_some());
//! assert!(model.predict("carol", "dota").is_unknown());
//! ```

mod index;
mod predictor;

use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};
use crate::matrix::Layout;
use crate::predictor::Variant;

pub use index::{CosineIndex, Neighbor};
pub use predictor::{NeighborhoodPredictor, NeighborhoodState, RankedNeighbor};

/// User-based nearest-neighbor predictor
pub type UserKnn = NeighborhoodPredictor<UserBased>;

/// Item-based nearest-neighbor predictor
pub type ItemKnn = NeighborhoodPredictor<ItemBased>;

/// Which axis neighbors are searched on
pub trait Orientation: Send + Sync + 'static {
    /// Matrix layout: the subject axis runs along the rows
    const LAYOUT: Layout;
    /// Persisted variant tag
    const VARIANT: Variant;
}

/// Subjects are users
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserBased;

/// Subjects are items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemBased;

impl Orientation for UserBased {
    const LAYOUT: Layout = Layout::UserRows;
    const VARIANT: Variant = Variant::UserKnn;
}

impl Orientation for ItemBased {
    const LAYOUT: Layout = Layout::ItemRows;
    const VARIANT: Variant = Variant::ItemKnn;
}

/// Neighborhood predictor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodConfig {
    /// K, the number of neighbor rows averaged per prediction.
    /// Clamped to the number of subjects at fit time.
    pub neighbor_count: usize,
    /// Subject count from which distances are computed in parallel
    /// (only with the `parallel` feature)
    pub parallel_threshold: usize,
}

impl Default for NeighborhoodConfig {
    fn default() -> Self {
        Self {
            neighbor_count: 5,
            parallel_threshold: 1000,
        }
    }
}

impl NeighborhoodConfig {
    pub fn with_neighbor_count(mut self, neighbor_count: usize) -> Self {
        self.neighbor_count = neighbor_count;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.neighbor_count == 0 {
            return Err(RecommendError::Config(
                "neighbor_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NeighborhoodConfig::default();
        assert_eq!(config.neighbor_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_neighbors_rejected() {
        let config = NeighborhoodConfig::default().with_neighbor_count(0);
        assert!(matches!(config.validate(), Err(RecommendError::Config(_))));
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: NeighborhoodConfig = serde_json::from_str(r#"{"neighbor_count": 10}"#).unwrap();
        assert_eq!(config.neighbor_count, 10);
        assert_eq!(config.parallel_threshold, 1000);
    }
}
