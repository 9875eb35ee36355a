//! Held-out accuracy of a fitted predictor

use serde::{Deserialize, Serialize};

use crate::predictor::Predictor;
use crate::table::RatingTable;

/// Error metrics over a test table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Root mean squared error over scored records
    pub rmse: Option<f64>,
    /// Mean absolute error over scored records
    pub mae: Option<f64>,
    /// Records the predictor produced a score for
    pub scored: usize,
    /// Records that hit a cold-start identifier
    pub unknown: usize,
}

impl Evaluation {
    /// Share of test records that could be scored
    pub fn coverage(&self) -> f64 {
        let total = self.scored + self.unknown;
        if total == 0 {
            return 0.0;
        }
        self.scored as f64 / total as f64
    }
}

/// Score every record of `test` against `predictor`.
///
/// Unknown predictions are counted but excluded from the error metrics.
pub fn evaluate<P: Predictor + ?Sized>(predictor: &P, test: &RatingTable) -> Evaluation {
    let mut squared = 0.0;
    let mut absolute = 0.0;
    let mut scored = 0;
    let mut unknown = 0;

    for record in test.iter() {
        match predictor.predict(record.user_id, record.item_id).score() {
            Some(score) => {
                let error = score - record.rating;
                squared += error * error;
                absolute += error.abs();
                scored += 1;
            }
            None => unknown += 1,
        }
    }

    let (rmse, mae) = if scored == 0 {
        (None, None)
    } else {
        let n = scored as f64;
        (Some((squared / n).sqrt()), Some(absolute / n))
    };

    Evaluation {
        rmse,
        mae,
        scored,
        unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighborhood::UserKnn;
    use crate::table::RatingRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_perfect_fit_has_zero_error() {
        let train = RatingTable::from_records(vec![
            RatingRecord::new("u1", "i1", 3.0),
            RatingRecord::new("u2", "i1", 3.0),
        ]);
        let mut model = UserKnn::new();
        model.fit(&train).unwrap();

        let result = evaluate(&model, &train);
        assert_eq!(result.rmse, Some(0.0));
        assert_eq!(result.mae, Some(0.0));
        assert_eq!(result.scored, 2);
        assert_eq!(result.coverage(), 1.0);
    }

    #[test]
    fn test_unknown_records_excluded() {
        let train = RatingTable::from_records(vec![RatingRecord::new("u1", "i1", 4.0)]);
        let test = RatingTable::from_records(vec![
            RatingRecord::new("u1", "i1", 2.0),
            RatingRecord::new("u9", "i1", 5.0),
        ]);
        let mut model = UserKnn::new();
        model.fit(&train).unwrap();

        let result = evaluate(&model, &test);
        assert_eq!(result.scored, 1);
        assert_eq!(result.unknown, 1);
        assert_eq!(result.rmse, Some(2.0));
        assert_eq!(result.coverage(), 0.5);
    }

    #[test]
    fn test_nothing_scored() {
        let model = UserKnn::new();
        let test = RatingTable::from_records(vec![RatingRecord::new("u1", "i1", 2.0)]);
        let result = evaluate(&model, &test);
        assert_eq!(result.rmse, None);
        assert_eq!(result.unknown, 1);
    }
}
