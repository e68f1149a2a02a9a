//! Fit-statistic service for subset models.
//!
//! The dominance engine treats fitting as a black box: given the response,
//! the design columns of one subset (members of its predictor units plus the
//! always-included covariates), and the prior weights, return one scalar fit
//! statistic. Every call is pure, so subsets may be fitted concurrently over
//! shared read-only inputs.

use nalgebra::{DMatrix, DVector};

use crate::domain::{DominanceOptions, FamilyKind, FitStatKind, LinkKind};
use crate::error::DominanceError;
use crate::math::glm::{fit_glm, validate_response};
use crate::math::ols::{solve_weighted_least_squares, weighted_r_squared};

/// Canonical family for a link, used when only the link is specified.
pub fn canonical_family(link: LinkKind) -> FamilyKind {
    match link {
        LinkKind::Identity => FamilyKind::Normal,
        LinkKind::Logit => FamilyKind::Bernoulli,
        LinkKind::Log => FamilyKind::Poisson,
        LinkKind::Inverse => FamilyKind::Gamma,
        LinkKind::InverseSquare => FamilyKind::InverseGaussian,
        LinkKind::NegativeBinomial => FamilyKind::NegativeBinomial,
    }
}

/// Canonical link for a family, used when only the family is specified.
pub fn canonical_link(family: FamilyKind) -> LinkKind {
    match family {
        FamilyKind::Normal => LinkKind::Identity,
        FamilyKind::Bernoulli => LinkKind::Logit,
        FamilyKind::Poisson => LinkKind::Log,
        FamilyKind::Gamma => LinkKind::Inverse,
        FamilyKind::InverseGaussian => LinkKind::InverseSquare,
        FamilyKind::NegativeBinomial => LinkKind::NegativeBinomial,
    }
}

/// Concrete fitting engine after option resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitEngine {
    /// Ordinary (weighted) least squares, reporting R².
    LeastSquares,
    /// Generalized linear fit, reporting the requested pseudo-R².
    Glm {
        family: FamilyKind,
        link: LinkKind,
        fit_stat: FitStatKind,
    },
}

/// Resolve the user options into a fitting engine.
///
/// No link and no family selects least squares; otherwise the missing half
/// of the pair is filled in from the canonical tables. Cox-Snell and
/// Nagelkerke are likelihood-ratio constructions and are only supported for
/// the discrete families, whose log-likelihood is bounded above by zero;
/// requesting them elsewhere is an `InvalidOption` raised before any
/// fitting.
pub fn resolve_engine(options: &DominanceOptions) -> Result<FitEngine, DominanceError> {
    let (family, link) = match (options.family, options.link) {
        (None, None) => return Ok(FitEngine::LeastSquares),
        (Some(family), Some(link)) => (family, link),
        (None, Some(link)) => (canonical_family(link), link),
        (Some(family), None) => (family, canonical_link(family)),
    };

    if matches!(
        options.fit_stat,
        FitStatKind::CoxSnell | FitStatKind::Nagelkerke
    ) && !matches!(
        family,
        FamilyKind::Bernoulli | FamilyKind::Poisson | FamilyKind::NegativeBinomial
    ) {
        return Err(DominanceError::InvalidOption(format!(
            "The {} fit statistic is not supported for the {} family.",
            options.fit_stat.display_name(),
            family.display_name()
        )));
    }

    Ok(FitEngine::Glm {
        family,
        link,
        fit_stat: options.fit_stat,
    })
}

/// Fits subset models against a fixed response and weight vector.
///
/// Holds only shared references plus per-run constants (the null-model
/// log-likelihood), so one `Fitter` is safely shared by parallel workers.
#[derive(Debug)]
pub struct Fitter<'a> {
    y: &'a [f64],
    weights: &'a [f64],
    engine: FitEngine,
    /// Intercept-only log-likelihood; the common reference point of every
    /// pseudo-R² in one run. Unused for least squares.
    null_log_likelihood: f64,
}

impl<'a> Fitter<'a> {
    /// Validate the response against the engine and precompute the
    /// null-model log-likelihood for generalized fits.
    pub fn new(
        y: &'a [f64],
        weights: &'a [f64],
        engine: FitEngine,
    ) -> Result<Self, DominanceError> {
        let null_log_likelihood = match engine {
            FitEngine::LeastSquares => 0.0,
            FitEngine::Glm { family, link, .. } => {
                validate_response(family, y)?;
                let x = design_matrix(y.len(), &[]);
                fit_glm(&x, y, weights, family, link)?.log_likelihood
            }
        };
        Ok(Self {
            y,
            weights,
            engine,
            null_log_likelihood,
        })
    }

    /// Fit one subset model and return its fit statistic.
    ///
    /// `columns` are the design columns beyond the intercept (covariates
    /// plus the flattened members of the subset's predictor units); an empty
    /// slice fits the intercept-only model.
    pub fn fit_statistic(&self, columns: &[&[f64]]) -> Result<f64, DominanceError> {
        let x = design_matrix(self.y.len(), columns);
        let stat = match self.engine {
            FitEngine::LeastSquares => {
                let y = DVector::from_column_slice(self.y);
                let beta = solve_weighted_least_squares(&x, &y, self.weights).ok_or_else(|| {
                    DominanceError::FitFailure(
                        "Singular design matrix in least-squares fit.".to_string(),
                    )
                })?;
                let fitted = x * beta;
                weighted_r_squared(self.y, fitted.as_slice(), self.weights)
            }
            FitEngine::Glm {
                family,
                link,
                fit_stat,
            } => {
                let fit = fit_glm(&x, self.y, self.weights, family, link)?;
                pseudo_r_squared(
                    fit_stat,
                    fit.log_likelihood,
                    self.null_log_likelihood,
                    self.weights.iter().sum(),
                )
            }
        };

        if stat.is_finite() {
            Ok(stat)
        } else {
            Err(DominanceError::FitFailure(
                "Fit produced a non-finite statistic.".to_string(),
            ))
        }
    }
}

/// Build a design matrix with a leading intercept column.
fn design_matrix(n: usize, columns: &[&[f64]]) -> DMatrix<f64> {
    let p = columns.len() + 1;
    let mut x = DMatrix::<f64>::zeros(n, p);
    for i in 0..n {
        x[(i, 0)] = 1.0;
    }
    for (j, col) in columns.iter().enumerate() {
        for i in 0..n {
            x[(i, j + 1)] = col[i];
        }
    }
    x
}

/// Pseudo-R² from model and null log-likelihoods.
///
/// `n_eff` is the sum of prior weights (the row count for unweighted fits).
fn pseudo_r_squared(kind: FitStatKind, ll: f64, ll_null: f64, n_eff: f64) -> f64 {
    match kind {
        FitStatKind::McFadden => 1.0 - ll / ll_null,
        FitStatKind::CoxSnell => 1.0 - (2.0 * (ll_null - ll) / n_eff).exp(),
        FitStatKind::Nagelkerke => {
            let cox_snell = 1.0 - (2.0 * (ll_null - ll) / n_eff).exp();
            cox_snell / (1.0 - (2.0 * ll_null / n_eff).exp())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn canonical_tables_are_inverse_on_canonical_pairs() {
        for link in [
            LinkKind::Identity,
            LinkKind::Logit,
            LinkKind::Log,
            LinkKind::Inverse,
            LinkKind::InverseSquare,
            LinkKind::NegativeBinomial,
        ] {
            assert_eq!(canonical_link(canonical_family(link)), link);
        }
    }

    #[test]
    fn no_link_no_family_selects_least_squares() {
        let options = DominanceOptions::default();
        assert_eq!(resolve_engine(&options).unwrap(), FitEngine::LeastSquares);
    }

    #[test]
    fn link_alone_resolves_the_family() {
        let options = DominanceOptions {
            link: Some(LinkKind::Logit),
            ..DominanceOptions::default()
        };
        assert_eq!(
            resolve_engine(&options).unwrap(),
            FitEngine::Glm {
                family: FamilyKind::Bernoulli,
                link: LinkKind::Logit,
                fit_stat: FitStatKind::McFadden,
            }
        );
    }

    #[test]
    fn unsupported_fit_stat_family_pair_is_rejected() {
        let options = DominanceOptions {
            link: Some(LinkKind::Inverse),
            fit_stat: FitStatKind::Nagelkerke,
            ..DominanceOptions::default()
        };
        let err = resolve_engine(&options).unwrap_err();
        assert!(matches!(err, DominanceError::InvalidOption(_)));
    }

    #[test]
    fn least_squares_statistic_is_r_squared() {
        // y depends on x1 only; adding x1 should explain everything.
        let y = [1.0, 3.0, 5.0, 7.0];
        let x1 = [0.0, 1.0, 2.0, 3.0];
        let w = [1.0; 4];

        let fitter = Fitter::new(&y, &w, FitEngine::LeastSquares).unwrap();
        let full = fitter.fit_statistic(&[&x1]).unwrap();
        assert_abs_diff_eq!(full, 1.0, epsilon = 1e-10);

        let null = fitter.fit_statistic(&[]).unwrap();
        assert_abs_diff_eq!(null, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn mcfadden_is_zero_for_the_null_model() {
        let y = [0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let w = [1.0; 6];
        let engine = FitEngine::Glm {
            family: FamilyKind::Bernoulli,
            link: LinkKind::Logit,
            fit_stat: FitStatKind::McFadden,
        };

        let fitter = Fitter::new(&y, &w, engine).unwrap();
        let null = fitter.fit_statistic(&[]).unwrap();
        assert_abs_diff_eq!(null, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn informative_predictor_raises_the_pseudo_r_squared() {
        // Overlapping classes around x = 0.5 so the MLE stays finite.
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        let x1 = [0.1, 0.3, 0.2, 0.9, 0.8, 0.7, 0.4, 0.6];
        let w = [1.0; 8];
        let engine = FitEngine::Glm {
            family: FamilyKind::Bernoulli,
            link: LinkKind::Logit,
            fit_stat: FitStatKind::McFadden,
        };

        let fitter = Fitter::new(&y, &w, engine).unwrap();
        let with = fitter.fit_statistic(&[&x1]).unwrap();
        assert!(with > 0.2, "informative predictor should lift fit, got {with}");
        assert!(with < 1.0);
    }

    #[test]
    fn bernoulli_response_is_validated_up_front() {
        let y = [0.0, 0.5, 1.0];
        let w = [1.0; 3];
        let engine = FitEngine::Glm {
            family: FamilyKind::Bernoulli,
            link: LinkKind::Logit,
            fit_stat: FitStatKind::McFadden,
        };
        let err = Fitter::new(&y, &w, engine).unwrap_err();
        assert!(matches!(err, DominanceError::InvalidData(_)));
    }
}
