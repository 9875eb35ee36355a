//! Non-negative matrix factorization by coordinate descent
//!
//! Minimizes ½‖X − WH‖²_F subject to W ≥ 0, H ≥ 0 with one Newton step per
//! coordinate (HALS), alternating W and H sweeps. Stops when the summed
//! projected gradient falls to `tol` times its value after the first sweep.

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Solver parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NmfParams {
    pub n_components: usize,
    pub seed: u64,
    pub max_iter: usize,
    pub tol: f64,
}

/// Solver output. `w` is (rows × r), `h` is (r × cols).
#[derive(Debug, Clone, PartialEq)]
pub struct Factorization {
    pub w: Array2<f64>,
    pub h: Array2<f64>,
    pub iterations: usize,
    /// Last projected-gradient violation divided by the first one
    pub relative_violation: f64,
    pub converged: bool,
}

/// Factorize a non-negative matrix.
///
/// Identical input and parameters give bit-identical factors.
pub fn factorize(x: &Array2<f64>, params: &NmfParams) -> Factorization {
    let (mut w, mut h) = random_init(x, params.n_components, params.seed);

    let mut violation_init = 0.0;
    let mut relative_violation = 1.0;
    let mut iterations = 0;
    let mut converged = false;

    for sweep in 1..=params.max_iter {
        iterations = sweep;

        let hht = h.dot(&h.t());
        let xht = x.dot(&h.t());
        let mut violation = update_coordinates(&mut w, &hht, &xht);

        let mut ht = h.t().to_owned();
        let wtw = w.t().dot(&w);
        let xtw = x.t().dot(&w);
        violation += update_coordinates(&mut ht, &wtw, &xtw);
        h.assign(&ht.t());

        if sweep == 1 {
            violation_init = violation;
        }
        if violation_init == 0.0 {
            relative_violation = 0.0;
            converged = true;
            break;
        }

        relative_violation = violation / violation_init;
        if relative_violation <= params.tol {
            converged = true;
            break;
        }
    }

    // A zero tolerance asks for exactly max_iter sweeps
    if params.tol == 0.0 {
        converged = true;
    }

    Factorization {
        w,
        h,
        iterations,
        relative_violation,
        converged,
    }
}

/// Frobenius norm of X − WH
pub fn reconstruction_error(x: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let residual = x - &w.dot(h);
    residual.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Scaled half-normal initialization: entries are |N(0,1)| · sqrt(mean(X) / r).
/// H is drawn before W.
fn random_init(x: &Array2<f64>, n_components: usize, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let (n_rows, n_cols) = x.dim();
    let avg = (x.mean().unwrap_or(0.0) / n_components as f64).sqrt();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let h = Array2::from_shape_fn((n_components, n_cols), |_| {
        avg * rng.sample::<f64, _>(StandardNormal).abs()
    });
    let w = Array2::from_shape_fn((n_rows, n_components), |_| {
        avg * rng.sample::<f64, _>(StandardNormal).abs()
    });
    (w, h)
}

/// One coordinate sweep over `factors` (n × r) given the Gram matrix
/// `gram` (r × r) of the fixed factor and `target` = X·fixedᵀ (n × r).
/// Returns the L1 norm of the projected gradient seen during the sweep.
fn update_coordinates(factors: &mut Array2<f64>, gram: &Array2<f64>, target: &Array2<f64>) -> f64 {
    let (n_samples, n_components) = factors.dim();
    let mut violation = 0.0;

    for t in 0..n_components {
        let hess = gram[[t, t]];

        for i in 0..n_samples {
            let mut grad = -target[[i, t]];
            for r in 0..n_components {
                grad += gram[[t, r]] * factors[[i, r]];
            }

            let projected = if factors[[i, t]] == 0.0 {
                grad.min(0.0)
            } else {
                grad
            };
            violation += projected.abs();

            if hess != 0.0 {
                factors[[i, t]] = (factors[[i, t]] - grad / hess).max(0.0);
            }
        }
    }

    violation
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(n_components: usize) -> NmfParams {
        NmfParams {
            n_components,
            seed: 42,
            max_iter: 500,
            tol: 1e-6,
        }
    }

    #[test]
    fn test_shapes_and_non_negativity() {
        let x = array![[5.0, 3.0, 0.0], [4.0, 0.0, 1.0], [1.0, 1.0, 5.0], [0.0, 1.0, 4.0]];
        let result = factorize(&x, &params(2));
        assert_eq!(result.w.dim(), (4, 2));
        assert_eq!(result.h.dim(), (2, 3));
        assert!(result.w.iter().chain(result.h.iter()).all(|&v| v >= 0.0));
    }

    #[test]
    fn test_exact_low_rank_is_recovered() {
        // rank 1: outer product of [1, 2, 3] and [2, 1]
        let x = array![[2.0, 1.0], [4.0, 2.0], [6.0, 3.0]];
        let result = factorize(&x, &params(1));
        let err = reconstruction_error(&x, &result.w, &result.h);
        assert!(err < 1e-3, "reconstruction error too high: {}", err);
    }

    #[test]
    fn test_error_decreases_with_iterations() {
        let x = array![[5.0, 3.0, 0.0, 1.0], [4.0, 0.0, 0.0, 1.0], [1.0, 1.0, 0.0, 5.0]];
        let short = factorize(&x, &NmfParams { max_iter: 1, tol: 0.0, ..params(2) });
        let long = factorize(&x, &NmfParams { max_iter: 200, ..params(2) });
        let short_err = reconstruction_error(&x, &short.w, &short.h);
        let long_err = reconstruction_error(&x, &long.w, &long.h);
        assert!(long_err <= short_err);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let x = array![[5.0, 3.0, 0.0], [4.0, 0.0, 1.0], [1.0, 1.0, 5.0]];
        let a = factorize(&x, &params(2));
        let b = factorize(&x, &params(2));
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_initialization() {
        let x = array![[5.0, 3.0, 0.0], [4.0, 0.0, 1.0], [1.0, 1.0, 5.0]];
        let a = random_init(&x, 2, 42);
        let b = random_init(&x, 2, 7);
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn test_zero_matrix_converges_immediately() {
        let x = Array2::<f64>::zeros((2, 3));
        let result = factorize(&x, &params(2));
        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert!(result.w.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_budget_exhaustion_not_converged() {
        let x = array![[5.0, 3.0, 0.0], [4.0, 0.0, 1.0], [1.0, 1.0, 5.0]];
        let result = factorize(&x, &NmfParams { max_iter: 1, tol: 1e-12, ..params(2) });
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
    }
}
