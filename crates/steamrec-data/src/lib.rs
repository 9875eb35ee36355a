//! Data supply for steamrec
//!
//! Everything the recommendation core deliberately does not do: reading rating
//! tables from disk, caching them, and holding out a test set.
//!
//! # Example
//!
//! ```rust
//! use steamrec_core::{evaluate, Predictor, UserKnn};
//! use steamrec_data::{parse_json_table, train_test_split};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = parse_json_table(r#"[
//!     {"user_id": "a", "item_id": 620, "rating": 5},
//!     {"user_id": "a", "item_id": 570, "rating": 2},
//!     {"user_id": "b", "item_id": 620, "rating": 4},
//!     {"user_id": "b", "item_id": 570, "rating": 1}
//! ]"#)?;
//!
//! let (train, test) = train_test_split(&table, 0.25, 42)?;
//! let mut model = UserKnn::default();
//! model.fit(&train)?;
//! let metrics = evaluate(&model, &test);
//! assert_eq!(metrics.scored + metrics.unknown, 1);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod json;
pub mod split;

// Re-export main types
pub use cache::TableCache;
pub use error::{DataError, Result};
pub use json::{load_json_table, parse_json_table, read_json_table};
pub use split::train_test_split;
