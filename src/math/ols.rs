//! Weighted least squares solver.
//!
//! Every subset model reduces to a small linear regression problem of the
//! form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! solved directly for linear fits and once per IRLS iteration for
//! generalized linear fits.
//!
//! Implementation choices:
//! - We scale rows by `sqrt(w_i)` and solve an ordinary least squares problem.
//! - We use SVD to solve the least-squares problem robustly even when the
//!   design matrix is tall (more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic
//!   for non-square matrices.)
//! - Parameter dimension is the flattened term count plus covariates plus
//!   the intercept, which stays small in practice, so SVD performance is
//!   acceptable even across the full powerset.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Nearly collinear predictors (or a subset whose members are linear
    // combinations of the covariates) produce near-singular designs, so try
    // progressively looser tolerances before giving up.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve `min Σ w_i (y_i - x_i^T β)^2` by scaling rows with `sqrt(w_i)`.
///
/// `x` and `y` are unweighted; weights must be non-negative and finite.
pub fn solve_weighted_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    weights: &[f64],
) -> Option<DVector<f64>> {
    let n = x.nrows();
    let p = x.ncols();
    debug_assert_eq!(weights.len(), n);

    let mut xw = DMatrix::<f64>::zeros(n, p);
    let mut yw = DVector::<f64>::zeros(n);
    for i in 0..n {
        let sw = weights[i].sqrt();
        if !sw.is_finite() {
            return None;
        }
        for j in 0..p {
            xw[(i, j)] = x[(i, j)] * sw;
        }
        yw[i] = y[i] * sw;
    }

    solve_least_squares(&xw, &yw)
}

/// Weighted coefficient of determination.
///
/// `R² = 1 - Σ w (y - ŷ)² / Σ w (y - ȳ_w)²` with `ȳ_w` the weighted mean.
/// Returns `NaN` when the response has no weighted variance; the caller
/// treats a non-finite statistic as a fit failure.
pub fn weighted_r_squared(y: &[f64], fitted: &[f64], weights: &[f64]) -> f64 {
    let mut w_total = 0.0;
    let mut wy_total = 0.0;
    for (&yi, &wi) in y.iter().zip(weights) {
        w_total += wi;
        wy_total += wi * yi;
    }
    if w_total <= 0.0 {
        return f64::NAN;
    }
    let y_bar = wy_total / w_total;

    let mut sse = 0.0;
    let mut sst = 0.0;
    for ((&yi, &fi), &wi) in y.iter().zip(fitted).zip(weights) {
        let r = yi - fi;
        let d = yi - y_bar;
        sse += wi * r * r;
        sst += wi * d * d;
    }
    if sst <= 0.0 {
        return f64::NAN;
    }

    1.0 - sse / sst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn weighting_pulls_the_fit_toward_heavy_rows() {
        // Two inconsistent observations at x = 1; the heavy one wins.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[0.0, 1.0, 3.0]);

        let light = solve_weighted_least_squares(&x, &y, &[1.0, 1.0, 1.0]).unwrap();
        let heavy = solve_weighted_least_squares(&x, &y, &[1.0, 1.0, 100.0]).unwrap();

        let light_at_1 = light[0] + light[1];
        let heavy_at_1 = heavy[0] + heavy[1];
        assert!((light_at_1 - 2.0).abs() < 1e-9);
        assert!(heavy_at_1 > 2.5);
    }

    #[test]
    fn r_squared_is_one_for_exact_fit_and_zero_for_mean() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let w = [1.0; 4];
        assert!((weighted_r_squared(&y, &y, &w) - 1.0).abs() < 1e-12);

        let mean = [2.5; 4];
        assert!(weighted_r_squared(&y, &mean, &w).abs() < 1e-12);
    }

    #[test]
    fn r_squared_is_nan_for_constant_response() {
        let y = [2.0, 2.0, 2.0];
        let fitted = [2.0, 2.0, 2.0];
        assert!(weighted_r_squared(&y, &fitted, &[1.0; 3]).is_nan());
    }
}
