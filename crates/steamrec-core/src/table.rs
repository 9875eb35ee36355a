//! Rating table - the input contract of the core
//!
//! A long-format table with exactly three meaningful columns:
//! `user_id`, `item_id` and `rating`. Where the rows came from (Steam
//! reviews, Parquet exports, fixtures) is the data-supply layer's business.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Column holding user identifiers
pub const USER_ID: &str = "user_id";
/// Column holding item identifiers
pub const ITEM_ID: &str = "item_id";
/// Column holding numeric ratings
pub const RATING: &str = "rating";

/// A single (user, item, rating) observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: String,
    pub item_id: String,
    pub rating: f64,
}

impl RatingRecord {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, rating: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            rating,
        }
    }
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRef<'a> {
    pub user_id: &'a str,
    pub item_id: &'a str,
    pub rating: f64,
}

/// Loosely typed column, as handed over by a dataframe-like source
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Number(Vec<f64>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Text(values) => values.len(),
            Column::Number(values) => values.len(),
        }
    }

    /// Identifier columns accept text or numbers; numbers use their decimal form.
    fn into_ids(self) -> Vec<String> {
        match self {
            Column::Text(values) => values,
            Column::Number(values) => values.into_iter().map(format_numeric_id).collect(),
        }
    }
}

/// Render a numeric identifier the way it was most likely written upstream:
/// integral values without a fractional part.
pub fn format_numeric_id(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Columnar rating table in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    user_ids: Vec<String>,
    item_ids: Vec<String>,
    ratings: Vec<f64>,
}

impl RatingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from typed records, preserving order
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RatingRecord>,
    {
        let mut table = Self::new();
        for record in records {
            table.push(record);
        }
        table
    }

    /// Build from named columns.
    ///
    /// `user_id`, `item_id` and `rating` must all be present and equally long.
    /// Any other columns are ignored.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut user_ids = None;
        let mut item_ids = None;
        let mut ratings = None;

        for (name, column) in columns {
            match name.into().as_str() {
                USER_ID => user_ids = Some(column),
                ITEM_ID => item_ids = Some(column),
                RATING => ratings = Some(column),
                _ => {}
            }
        }

        let user_ids = user_ids.ok_or_else(|| InputError::MissingColumn(USER_ID.into()))?;
        let item_ids = item_ids.ok_or_else(|| InputError::MissingColumn(ITEM_ID.into()))?;
        let ratings = match ratings.ok_or_else(|| InputError::MissingColumn(RATING.into()))? {
            Column::Number(values) => values,
            Column::Text(_) => {
                return Err(InputError::ColumnType {
                    column: RATING.into(),
                    expected: "numeric",
                })
            }
        };

        if user_ids.len() != item_ids.len() || user_ids.len() != ratings.len() {
            return Err(InputError::RaggedColumns {
                user_ids: user_ids.len(),
                item_ids: item_ids.len(),
                ratings: ratings.len(),
            });
        }

        Ok(Self {
            user_ids: user_ids.into_ids(),
            item_ids: item_ids.into_ids(),
            ratings,
        })
    }

    /// Append a record
    pub fn push(&mut self, record: RatingRecord) {
        self.user_ids.push(record.user_id);
        self.item_ids.push(record.item_id);
        self.ratings.push(record.rating);
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Row at `position`, if any
    pub fn get(&self, position: usize) -> Option<RatingRef<'_>> {
        Some(RatingRef {
            user_id: self.user_ids.get(position)?,
            item_id: self.item_ids.get(position)?,
            rating: *self.ratings.get(position)?,
        })
    }

    /// Iterate rows in input order
    pub fn iter(&self) -> impl Iterator<Item = RatingRef<'_>> + '_ {
        self.user_ids
            .iter()
            .zip(&self.item_ids)
            .zip(&self.ratings)
            .map(|((user_id, item_id), &rating)| RatingRef {
                user_id,
                item_id,
                rating,
            })
    }

    /// Copy of the rows at the given positions, in the given order
    pub fn select(&self, positions: &[usize]) -> Self {
        let mut table = Self::new();
        for row in positions.iter().filter_map(|&p| self.get(p)) {
            table.push(RatingRecord::new(row.user_id, row.item_id, row.rating));
        }
        table
    }
}

impl FromIterator<RatingRecord> for RatingTable {
    fn from_iter<T: IntoIterator<Item = RatingRecord>>(iter: T) -> Self {
        Self::from_records(iter)
    }
}
