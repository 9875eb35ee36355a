//! Brute-force cosine neighbor search over matrix rows

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::similarity::{cosine_distance_with_norms, l2_norm};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A row and its distance from the query row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f64,
}

/// Exhaustive cosine search. Caches the L2 norm of every row.
///
/// The rows themselves stay in the interaction matrix and are passed to
/// each query. The index is derived data: it is never persisted and is
/// rebuilt from the matrix on load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CosineIndex {
    norms: Vec<f64>,
    parallel_threshold: usize,
}

impl CosineIndex {
    /// Index the rows of `data`
    pub fn build(data: &Array2<f64>, parallel_threshold: usize) -> Self {
        let norms = data
            .axis_iter(Axis(0))
            .map(l2_norm)
            .collect();
        Self {
            norms,
            parallel_threshold,
        }
    }

    /// Number of indexed rows
    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// The `k` rows closest to row `query`, nearest first.
    ///
    /// The query row takes part in the ranking like any other. Equal
    /// distances are ordered by row position.
    pub fn kneighbors(&self, data: &Array2<f64>, query: usize, k: usize) -> Vec<Neighbor> {
        let mut neighbors = self.distances(data, query);

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.position.cmp(&b.position))
        });
        neighbors.truncate(k);
        neighbors
    }

    /// Distance from `query` to every row - parallel on large axes
    #[cfg(feature = "parallel")]
    fn distances(&self, data: &Array2<f64>, query: usize) -> Vec<Neighbor> {
        if self.norms.len() >= self.parallel_threshold {
            (0..self.norms.len())
                .into_par_iter()
                .map(|position| self.distance_to(data, query, position))
                .collect()
        } else {
            self.distances_sequential(data, query)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn distances(&self, data: &Array2<f64>, query: usize) -> Vec<Neighbor> {
        self.distances_sequential(data, query)
    }

    fn distances_sequential(&self, data: &Array2<f64>, query: usize) -> Vec<Neighbor> {
        (0..self.norms.len())
            .map(|position| self.distance_to(data, query, position))
            .collect()
    }

    fn distance_to(&self, data: &Array2<f64>, query: usize, position: usize) -> Neighbor {
        Neighbor {
            position,
            distance: cosine_distance_with_norms(
                data.row(query),
                self.norms[query],
                data.row(position),
                self.norms[position],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    fn positions(neighbors: &[Neighbor]) -> Vec<usize> {
        neighbors.iter().map(|n| n.position).collect()
    }

    #[test]
    fn test_self_is_nearest() {
        let data = array![[5.0, 0.0, 1.0], [0.0, 4.0, 0.0], [4.0, 0.0, 2.0]];
        let index = CosineIndex::build(&data, 1000);
        let neighbors = index.kneighbors(&data, 0, 3);
        assert_eq!(positions(&neighbors), vec![0, 2, 1]);
        assert!(neighbors[0].distance < 1e-12);
    }

    #[test]
    fn test_ties_break_by_position() {
        // rows 1 and 2 are identical, so equidistant from row 0
        let data = array![[1.0, 0.0], [1.0, 1.0], [1.0, 1.0], [0.0, 1.0]];
        let index = CosineIndex::build(&data, 1000);
        let neighbors = index.kneighbors(&data, 0, 3);
        assert_eq!(positions(&neighbors), vec![0, 1, 2]);
    }

    #[test]
    fn test_zero_row_is_equidistant() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [0.0, 2.0]];
        let index = CosineIndex::build(&data, 1000);
        let neighbors = index.kneighbors(&data, 0, 3);
        assert_eq!(positions(&neighbors), vec![0, 1, 2]);
        assert!(neighbors.iter().all(|n| n.distance == 1.0));
    }

    #[test]
    fn test_k_larger_than_rows() {
        let data = array![[1.0], [2.0]];
        let index = CosineIndex::build(&data, 1000);
        assert_eq!(index.kneighbors(&data, 1, 10).len(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_parallel_threshold_does_not_change_ranking() {
        let data = array![[3.0, 1.0, 0.0], [0.0, 1.0, 3.0], [3.0, 0.0, 1.0], [1.0, 1.0, 1.0]];
        let eager = CosineIndex::build(&data, 0);
        let lazy = CosineIndex::build(&data, usize::MAX);
        assert_eq!(eager.kneighbors(&data, 3, 4), lazy.kneighbors(&data, 3, 4));
    }
}
