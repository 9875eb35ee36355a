//! JSON record loading
//!
//! Accepts an array of objects, one per rating:
//!
//! ```json
//! [{"user_id": "76561198000000001", "item_id": 620, "rating": 1.0, "review": "..."}]
//! ```
//!
//! Identifiers may be strings or integers; extra keys are ignored.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::{Map, Value};
use steamrec_core::table::{format_numeric_id, ITEM_ID, RATING, USER_ID};
use steamrec_core::{InputError, RatingRecord, RatingTable};
use tracing::debug;

use crate::error::Result;

/// Parse a JSON array of rating objects
pub fn parse_json_table(json: &str) -> Result<RatingTable> {
    let rows: Vec<Map<String, Value>> = serde_json::from_str(json)?;
    rows_to_table(rows)
}

/// Read a JSON array of rating objects from any reader
pub fn read_json_table<R: Read>(reader: R) -> Result<RatingTable> {
    let rows: Vec<Map<String, Value>> = serde_json::from_reader(reader)?;
    rows_to_table(rows)
}

/// Load a JSON rating file
pub fn load_json_table(path: impl AsRef<Path>) -> Result<RatingTable> {
    let path = path.as_ref();
    let table = read_json_table(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), rows = table.len(), "loaded rating table");
    Ok(table)
}

fn rows_to_table(rows: Vec<Map<String, Value>>) -> Result<RatingTable> {
    let mut table = RatingTable::new();
    for row in rows {
        table.push(RatingRecord {
            user_id: identifier(&row, USER_ID)?,
            item_id: identifier(&row, ITEM_ID)?,
            rating: rating(&row)?,
        });
    }
    Ok(table)
}

fn identifier(row: &Map<String, Value>, column: &str) -> Result<String> {
    match row.get(column) {
        None | Some(Value::Null) => Err(InputError::MissingColumn(column.to_string()).into()),
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(n)) => Ok(match n.as_i64() {
            Some(id) => id.to_string(),
            None => match n.as_u64() {
                Some(id) => id.to_string(),
                None => format_numeric_id(n.as_f64().unwrap_or(f64::NAN)),
            },
        }),
        Some(_) => Err(InputError::ColumnType {
            column: column.to_string(),
            expected: "a string or number",
        }
        .into()),
    }
}

fn rating(row: &Map<String, Value>) -> Result<f64> {
    match row.get(RATING) {
        None | Some(Value::Null) => Err(InputError::MissingColumn(RATING.to_string()).into()),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            InputError::ColumnType {
                column: RATING.to_string(),
                expected: "numeric",
            }
            .into()
        }),
        Some(Value::Bool(voted_up)) => Ok(if *voted_up { 1.0 } else { 0.0 }),
        Some(_) => Err(InputError::ColumnType {
            column: RATING.to_string(),
            expected: "numeric",
        }
        .into()),
    }
}
