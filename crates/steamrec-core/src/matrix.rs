//! Interaction matrix builder
//!
//! Pivots a long-format [`RatingTable`] into a dense matrix. Axis order is
//! first-seen order of the identifiers, so the same input order always yields
//! the same matrix. Missing (user, item) pairs are 0.0, meaning "no signal".

use ahash::{AHashMap, AHashSet};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InputError, RecommendError, Result};
use crate::logging::target;
use crate::table::RatingTable;

/// Which identifier runs along the matrix rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Rows are users, columns are items
    UserRows,
    /// Rows are items, columns are users
    ItemRows,
}

/// Ordered identifier list with O(1) position lookup.
///
/// Only the list is serialized; the lookup map is rebuilt on load. A list
/// read from disk may repeat an id, which [`InteractionMatrix::validate`]
/// reports as corrupt state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IdIndex {
    ids: Vec<String>,
    positions: AHashMap<String, usize>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of `id`, inserting it at the end if unseen
    pub fn intern(&mut self, id: &str) -> usize {
        if let Some(&position) = self.positions.get(id) {
            return position;
        }
        let position = self.ids.len();
        self.ids.push(id.to_string());
        self.positions.insert(id.to_string(), position);
        position
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn id(&self, position: usize) -> Option<&str> {
        self.ids.get(position).map(String::as_str)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// First identifier that appears more than once, if any
    pub fn first_duplicate(&self) -> Option<&str> {
        if self.positions.len() == self.ids.len() {
            return None;
        }
        self.ids
            .iter()
            .enumerate()
            .find(|(position, id)| self.positions.get(id.as_str()) != Some(position))
            .map(|(_, id)| id.as_str())
    }
}

impl PartialEq for IdIndex {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl From<Vec<String>> for IdIndex {
    /// A repeated id keeps its first position
    fn from(ids: Vec<String>) -> Self {
        let mut positions = AHashMap::with_capacity(ids.len());
        for (position, id) in ids.iter().enumerate() {
            positions.entry(id.clone()).or_insert(position);
        }
        Self { ids, positions }
    }
}

impl From<IdIndex> for Vec<String> {
    fn from(index: IdIndex) -> Self {
        index.ids
    }
}

/// Dense (rows × cols) rating matrix plus its two axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMatrix {
    layout: Layout,
    rows: IdIndex,
    cols: IdIndex,
    values: Array2<f64>,
}

impl InteractionMatrix {
    /// Pivot `table` into a dense matrix with the given layout.
    ///
    /// Fails on an empty table, a repeated (user, item) pair, or a
    /// non-finite rating.
    pub fn build(table: &RatingTable, layout: Layout) -> std::result::Result<Self, InputError> {
        if table.is_empty() {
            return Err(InputError::EmptyTable);
        }

        let mut rows = IdIndex::new();
        let mut cols = IdIndex::new();
        let mut cells = Vec::with_capacity(table.len());
        let mut seen = AHashSet::with_capacity(table.len());

        for record in table.iter() {
            if !record.rating.is_finite() {
                return Err(InputError::NonFiniteRating {
                    user_id: record.user_id.to_string(),
                    item_id: record.item_id.to_string(),
                });
            }

            let (row_id, col_id) = match layout {
                Layout::UserRows => (record.user_id, record.item_id),
                Layout::ItemRows => (record.item_id, record.user_id),
            };
            let cell = (rows.intern(row_id), cols.intern(col_id));

            if !seen.insert(cell) {
                return Err(InputError::DuplicatePair {
                    user_id: record.user_id.to_string(),
                    item_id: record.item_id.to_string(),
                });
            }
            cells.push((cell, record.rating));
        }

        let mut values = Array2::zeros((rows.len(), cols.len()));
        for ((row, col), rating) in cells {
            values[[row, col]] = rating;
        }

        debug!(
            target: target::FIT,
            rows = rows.len(),
            cols = cols.len(),
            observed = table.len(),
            "built interaction matrix"
        );

        Ok(Self {
            layout,
            rows,
            cols,
            values,
        })
    }

    /// Reassemble a matrix from parts, checking that the axes match the shape
    pub fn from_parts(
        layout: Layout,
        rows: IdIndex,
        cols: IdIndex,
        values: Array2<f64>,
    ) -> Result<Self> {
        let matrix = Self {
            layout,
            rows,
            cols,
            values,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Check the axis/shape bijection and that every value is finite
    pub fn validate(&self) -> Result<()> {
        let (n_rows, n_cols) = self.values.dim();
        if n_rows != self.rows.len() || n_cols != self.cols.len() {
            return Err(RecommendError::CorruptState(format!(
                "matrix shape {}x{} does not match axes {}x{}",
                n_rows,
                n_cols,
                self.rows.len(),
                self.cols.len()
            )));
        }
        if n_rows == 0 || n_cols == 0 {
            return Err(RecommendError::CorruptState("empty interaction matrix".into()));
        }
        for (axis, index) in [("row", &self.rows), ("column", &self.cols)] {
            if let Some(id) = index.first_duplicate() {
                return Err(RecommendError::CorruptState(format!(
                    "duplicate identifier '{}' in {} axis",
                    id, axis
                )));
            }
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(RecommendError::CorruptState(
                "interaction matrix holds a non-finite value".into(),
            ));
        }
        Ok(())
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Row axis (users for `UserRows`, items for `ItemRows`)
    pub fn rows(&self) -> &IdIndex {
        &self.rows
    }

    /// Column axis
    pub fn cols(&self) -> &IdIndex {
        &self.cols
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row(&self, position: usize) -> ArrayView1<'_, f64> {
        self.values.row(position)
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Cell coordinates of a (user, item) pair under this layout
    pub fn locate(&self, user_id: &str, item_id: &str) -> Option<(usize, usize)> {
        let (row_id, col_id) = match self.layout {
            Layout::UserRows => (user_id, item_id),
            Layout::ItemRows => (item_id, user_id),
        };
        Some((self.rows.position(row_id)?, self.cols.position(col_id)?))
    }

    /// Stored value for a (user, item) pair; unobserved pairs read as 0.0
    pub fn get(&self, user_id: &str, item_id: &str) -> Option<f64> {
        self.locate(user_id, item_id)
            .map(|(row, col)| self.values[[row, col]])
    }
}
