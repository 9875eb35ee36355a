//! Cosine distance between rating rows
//!
//! Norms are computed once per row by the neighbor index and passed in, so
//! a query costs one dot product per candidate row.

use ndarray::ArrayView1;

/// Euclidean length of a row
pub(crate) fn l2_norm(v: ArrayView1<'_, f64>) -> f64 {
    v.dot(&v).sqrt()
}

/// Cosine distance (1 - similarity), clamped to [0, 2].
///
/// Similarity is 0.0 when either norm is zero, so a zero vector is at
/// distance 1.0 from everything, itself included.
pub(crate) fn cosine_distance_with_norms(
    a: ArrayView1<'_, f64>,
    norm_a: f64,
    b: ArrayView1<'_, f64>,
    norm_b: f64,
) -> f64 {
    debug_assert_eq!(
        a.len(),
        b.len(),
        "vector dimension mismatch: {} vs {}",
        a.len(),
        b.len()
    );

    let denom = norm_a * norm_b;
    let similarity = if denom == 0.0 { 0.0 } else { a.dot(&b) / denom };
    (1.0 - similarity).clamp(0.0, 2.0)
}
