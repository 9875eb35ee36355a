//! steamrec Core Engine
//!
//! Collaborative filtering over a long-format (user, item, rating) table:
//!
//! - [`UserKnn`] - user-based cosine nearest neighbors
//! - [`ItemKnn`] - item-based cosine nearest neighbors
//! - [`LatentFactorPredictor`] - non-negative matrix factorization
//!
//! All three implement [`Predictor`] (fit / predict) and [`Persist`]
//! (save / load). Queries for identifiers never seen during `fit` return
//! [`Prediction::Unknown`] instead of failing.
//!
//! # Features
//!
//! - `parallel` - compute neighbor distances with rayon on large axes
//!
//! # Example
//!
//! ```rust
//! use steamrec_core::{LatentFactorPredictor, Predictor, RatingRecord, RatingTable};
//!
//! let table = RatingTable::from_records(vec![
//!     RatingRecord::new("76561198000000001", "730", 1.0),
//!     RatingRecord::new("76561198000000001", "570", 0.0),
//!     RatingRecord::new("76561198000000002", "730", 1.0),
//! ]);
//!
//! let mut model = LatentFactorPredictor::default();
//! let report = model.fit(&table).unwrap();
//! assert_eq!(report.subjects, 2);
//!
//! let score = model.predict("76561198000000002", "570");
//! assert!(score.score().is_some());
//! ```

pub mod error;
pub mod evaluate;
pub mod latent;
pub mod logging;
pub mod matrix;
pub mod neighborhood;
pub mod persist;
pub mod predictor;
mod similarity;
pub mod table;

// Re-export main types at crate root
pub use error::{InputError, RecommendError, Result};
pub use evaluate::{evaluate, Evaluation};
pub use latent::{LatentFactorConfig, LatentFactorPredictor};
pub use matrix::{IdIndex, InteractionMatrix, Layout};
pub use neighborhood::{ItemKnn, NeighborhoodConfig, NeighborhoodPredictor, UserKnn};
pub use persist::{AnyPredictor, Persist};
pub use predictor::{Diagnostic, FitReport, Prediction, Predictor, Variant};
pub use table::{Column, RatingRecord, RatingTable};
