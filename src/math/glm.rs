//! Generalized linear model fitting via IRLS.
//!
//! Each iteration forms the working response and working weights from the
//! current mean, then solves a weighted least-squares problem with the
//! shared SVD solver:
//!
//! ```text
//! z_i = η_i + (y_i - μ_i) g'(μ_i)
//! W_i = w_i / (V(μ_i) g'(μ_i)^2)
//! ```
//!
//! Convergence is declared on a small relative deviance change. The fit is
//! deterministic given its inputs, so the caller may run many fits
//! concurrently over shared read-only data.

use nalgebra::{DMatrix, DVector};
use statrs::function::gamma::ln_gamma;

use crate::domain::{FamilyKind, LinkKind};
use crate::error::DominanceError;
use crate::math::ols::solve_weighted_least_squares;

const MAX_ITERATIONS: usize = 25;
const DEVIANCE_TOL: f64 = 1e-8;
/// Mean clamp for families with an open mean domain.
const MU_EPS: f64 = 1e-10;
/// Fixed negative-binomial shape. Shape estimation is out of scope; the
/// canonical-link table only pins the family.
pub const NEG_BIN_THETA: f64 = 1.0;

/// Converged IRLS fit.
#[derive(Debug, Clone)]
pub struct GlmFit {
    pub coefficients: Vec<f64>,
    pub fitted: Vec<f64>,
    pub deviance: f64,
    pub log_likelihood: f64,
    pub iterations: usize,
}

/// Check that the response values lie in the family's support.
pub fn validate_response(family: FamilyKind, y: &[f64]) -> Result<(), DominanceError> {
    let ok = match family {
        FamilyKind::Normal => true,
        FamilyKind::Bernoulli => y.iter().all(|&v| v == 0.0 || v == 1.0),
        FamilyKind::Poisson | FamilyKind::NegativeBinomial => y.iter().all(|&v| v >= 0.0),
        FamilyKind::Gamma | FamilyKind::InverseGaussian => y.iter().all(|&v| v > 0.0),
    };
    if ok {
        Ok(())
    } else {
        Err(DominanceError::InvalidData(format!(
            "Response values outside the support of the {} family.",
            family.display_name()
        )))
    }
}

/// Fit a GLM by iteratively reweighted least squares.
///
/// `x` is the unweighted design matrix (intercept included); `weights` are
/// prior observation weights passed through unchanged.
pub fn fit_glm(
    x: &DMatrix<f64>,
    y: &[f64],
    weights: &[f64],
    family: FamilyKind,
    link: LinkKind,
) -> Result<GlmFit, DominanceError> {
    let n = y.len();
    if n == 0 || x.nrows() != n || weights.len() != n {
        return Err(DominanceError::InvalidData(
            "Design, response, and weight lengths must agree and be non-empty.".to_string(),
        ));
    }

    let mut mu: Vec<f64> = y
        .iter()
        .zip(weights)
        .map(|(&yi, &wi)| clamp_mu(family, link, mu_start(family, yi, wi)))
        .collect();
    let mut eta: Vec<f64> = mu.iter().map(|&m| link_value(link, m)).collect();
    let mut deviance = total_deviance(family, y, &mu, weights);

    let mut coefficients: Option<DVector<f64>> = None;
    let mut converged_at = None;

    let mut working_z = DVector::<f64>::zeros(n);
    let mut working_w = vec![0.0; n];

    for iteration in 1..=MAX_ITERATIONS {
        for i in 0..n {
            let d = link_derivative(link, mu[i]);
            let v = variance(family, mu[i]);
            let w = weights[i] / (v * d * d);
            if !(w.is_finite() && w >= 0.0) {
                return Err(DominanceError::FitFailure(format!(
                    "Non-finite working weight in {} IRLS.",
                    family.display_name()
                )));
            }
            working_w[i] = w;
            working_z[i] = eta[i] + (y[i] - mu[i]) * d;
        }

        let beta = solve_weighted_least_squares(x, &working_z, &working_w).ok_or_else(|| {
            DominanceError::FitFailure(
                "Singular design matrix in IRLS iteration.".to_string(),
            )
        })?;

        let eta_new = x * &beta;
        for i in 0..n {
            eta[i] = eta_new[i];
            mu[i] = clamp_mu(family, link, link_inverse(link, eta[i]));
        }

        let deviance_new = total_deviance(family, y, &mu, weights);
        if !deviance_new.is_finite() {
            return Err(DominanceError::FitFailure(format!(
                "Non-finite deviance in {} IRLS.",
                family.display_name()
            )));
        }

        let delta = (deviance_new - deviance).abs() / (deviance_new.abs() + 0.1);
        deviance = deviance_new;
        coefficients = Some(beta);
        if delta < DEVIANCE_TOL {
            converged_at = Some(iteration);
            break;
        }
    }

    let (Some(iterations), Some(coefficients)) = (converged_at, coefficients) else {
        return Err(DominanceError::FitFailure(format!(
            "IRLS did not converge within {MAX_ITERATIONS} iterations."
        )));
    };

    let log_likelihood = log_likelihood(family, y, &mu, weights, deviance);
    if !log_likelihood.is_finite() {
        return Err(DominanceError::FitFailure(format!(
            "Non-finite log-likelihood for the {} family.",
            family.display_name()
        )));
    }

    Ok(GlmFit {
        coefficients: coefficients.iter().copied().collect(),
        fitted: mu,
        deviance,
        log_likelihood,
        iterations,
    })
}

/// `x ln(y)` with the `0 ln 0 = 0` convention.
fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0.0 { 0.0 } else { x * y.ln() }
}

fn mu_start(family: FamilyKind, y: f64, w: f64) -> f64 {
    match family {
        FamilyKind::Bernoulli => (w * y + 0.5) / (w + 1.0),
        FamilyKind::Poisson => y + 0.1,
        FamilyKind::NegativeBinomial => {
            if y == 0.0 {
                1.0 / 6.0
            } else {
                y
            }
        }
        FamilyKind::Normal | FamilyKind::Gamma | FamilyKind::InverseGaussian => y,
    }
}

fn clamp_mu(family: FamilyKind, link: LinkKind, mu: f64) -> f64 {
    match family {
        FamilyKind::Bernoulli => mu.clamp(MU_EPS, 1.0 - MU_EPS),
        FamilyKind::Poisson
        | FamilyKind::Gamma
        | FamilyKind::InverseGaussian
        | FamilyKind::NegativeBinomial => mu.max(MU_EPS),
        // The normal family has an unbounded mean, but positive-domain
        // links still need mu > 0 to stay evaluable.
        FamilyKind::Normal => match link {
            LinkKind::Log | LinkKind::Inverse | LinkKind::InverseSquare | LinkKind::NegativeBinomial => {
                mu.max(MU_EPS)
            }
            LinkKind::Identity | LinkKind::Logit => mu,
        },
    }
}

/// `η = g(μ)`.
fn link_value(link: LinkKind, mu: f64) -> f64 {
    match link {
        LinkKind::Identity => mu,
        LinkKind::Logit => (mu / (1.0 - mu)).ln(),
        LinkKind::Log => mu.ln(),
        LinkKind::Inverse => 1.0 / mu,
        LinkKind::InverseSquare => 1.0 / (mu * mu),
        LinkKind::NegativeBinomial => (mu / (mu + NEG_BIN_THETA)).ln(),
    }
}

/// `μ = g⁻¹(η)`.
fn link_inverse(link: LinkKind, eta: f64) -> f64 {
    match link {
        LinkKind::Identity => eta,
        LinkKind::Logit => 1.0 / (1.0 + (-eta).exp()),
        LinkKind::Log => eta.exp(),
        LinkKind::Inverse => 1.0 / eta,
        LinkKind::InverseSquare => 1.0 / eta.max(f64::MIN_POSITIVE).sqrt(),
        LinkKind::NegativeBinomial => {
            let e = eta.exp();
            NEG_BIN_THETA * e / (1.0 - e)
        }
    }
}

/// `g'(μ) = dη/dμ`.
fn link_derivative(link: LinkKind, mu: f64) -> f64 {
    match link {
        LinkKind::Identity => 1.0,
        LinkKind::Logit => 1.0 / (mu * (1.0 - mu)),
        LinkKind::Log => 1.0 / mu,
        LinkKind::Inverse => -1.0 / (mu * mu),
        LinkKind::InverseSquare => -2.0 / (mu * mu * mu),
        LinkKind::NegativeBinomial => NEG_BIN_THETA / (mu * (mu + NEG_BIN_THETA)),
    }
}

/// Variance function `V(μ)`.
fn variance(family: FamilyKind, mu: f64) -> f64 {
    match family {
        FamilyKind::Normal => 1.0,
        FamilyKind::Bernoulli => mu * (1.0 - mu),
        FamilyKind::Poisson => mu,
        FamilyKind::Gamma => mu * mu,
        FamilyKind::InverseGaussian => mu * mu * mu,
        FamilyKind::NegativeBinomial => mu + mu * mu / NEG_BIN_THETA,
    }
}

/// Unit deviance `d(y, μ)`.
fn unit_deviance(family: FamilyKind, y: f64, mu: f64) -> f64 {
    match family {
        FamilyKind::Normal => {
            let r = y - mu;
            r * r
        }
        FamilyKind::Bernoulli => {
            2.0 * (xlogy(y, y / mu) + xlogy(1.0 - y, (1.0 - y) / (1.0 - mu)))
        }
        FamilyKind::Poisson => 2.0 * (xlogy(y, y / mu) - (y - mu)),
        FamilyKind::Gamma => 2.0 * (-(y / mu).ln() + (y - mu) / mu),
        FamilyKind::InverseGaussian => {
            let r = y - mu;
            r * r / (y * mu * mu)
        }
        FamilyKind::NegativeBinomial => {
            let t = NEG_BIN_THETA;
            2.0 * (xlogy(y, y / mu) - (y + t) * ((y + t) / (mu + t)).ln())
        }
    }
}

fn total_deviance(family: FamilyKind, y: &[f64], mu: &[f64], weights: &[f64]) -> f64 {
    y.iter()
        .zip(mu)
        .zip(weights)
        .map(|((&yi, &mi), &wi)| wi * unit_deviance(family, yi, mi))
        .sum()
}

/// Weighted log-likelihood at the fitted means.
///
/// Gamma and inverse-Gaussian dispersions are profiled as `deviance / Σw`;
/// the normal variance is the ML estimate.
fn log_likelihood(family: FamilyKind, y: &[f64], mu: &[f64], weights: &[f64], deviance: f64) -> f64 {
    let w_total: f64 = weights.iter().sum();
    match family {
        FamilyKind::Bernoulli => y
            .iter()
            .zip(mu)
            .zip(weights)
            .map(|((&yi, &mi), &wi)| wi * (xlogy(yi, mi) + xlogy(1.0 - yi, 1.0 - mi)))
            .sum(),
        FamilyKind::Poisson => y
            .iter()
            .zip(mu)
            .zip(weights)
            .map(|((&yi, &mi), &wi)| wi * (xlogy(yi, mi) - mi - ln_gamma(yi + 1.0)))
            .sum(),
        FamilyKind::Normal => {
            let sse: f64 = y
                .iter()
                .zip(mu)
                .zip(weights)
                .map(|((&yi, &mi), &wi)| {
                    let r = yi - mi;
                    wi * r * r
                })
                .sum();
            let sigma2 = (sse / w_total).max(f64::MIN_POSITIVE);
            -0.5 * w_total * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0)
        }
        FamilyKind::Gamma => {
            let phi = (deviance / w_total).max(MU_EPS);
            let shape = 1.0 / phi;
            y.iter()
                .zip(mu)
                .zip(weights)
                .map(|((&yi, &mi), &wi)| {
                    wi * (shape * (shape / mi).ln() - ln_gamma(shape)
                        + (shape - 1.0) * yi.ln()
                        - shape * yi / mi)
                })
                .sum()
        }
        FamilyKind::InverseGaussian => {
            let phi = (deviance / w_total).max(MU_EPS);
            let lambda = 1.0 / phi;
            y.iter()
                .zip(mu)
                .zip(weights)
                .map(|((&yi, &mi), &wi)| {
                    let r = yi - mi;
                    wi * 0.5
                        * ((lambda / (2.0 * std::f64::consts::PI * yi * yi * yi)).ln()
                            - lambda * r * r / (mi * mi * yi))
                })
                .sum()
        }
        FamilyKind::NegativeBinomial => {
            let t = NEG_BIN_THETA;
            y.iter()
                .zip(mu)
                .zip(weights)
                .map(|((&yi, &mi), &wi)| {
                    wi * (ln_gamma(yi + t) - ln_gamma(t) - ln_gamma(yi + 1.0)
                        + t * (t / (t + mi)).ln()
                        + xlogy(yi, mi / (t + mi)))
                })
                .sum()
        }
    }
}
