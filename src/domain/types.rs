//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during an analysis run
//! - exported to JSON snapshots
//! - reloaded later for comparisons across runs

use serde::{Deserialize, Serialize};

/// A predictor unit entering the combinatorial analysis.
///
/// A `Set` groups several columns that are always entered and removed
/// together; it counts as one unit in every subset, so a set of three
/// variables still contributes cardinality 1.
///
/// Identity is by name. Within one run no two units may share a column, and
/// a set's members may not reappear as separate predictors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predictor {
    Single(String),
    Set(Vec<String>),
}

impl Predictor {
    pub fn single(name: impl Into<String>) -> Self {
        Predictor::Single(name.into())
    }

    pub fn set<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predictor::Set(names.into_iter().map(Into::into).collect())
    }

    /// The member columns of this unit, in declared order.
    pub fn member_names(&self) -> &[String] {
        match self {
            Predictor::Single(name) => std::slice::from_ref(name),
            Predictor::Set(names) => names,
        }
    }
}

/// Display labels for a list of predictor units.
///
/// Single predictors are labelled by their column name; sets are labelled
/// `Set1`, `Set2`, ... in input order.
pub fn unit_labels(predictors: &[Predictor]) -> Vec<String> {
    let mut set_no = 0usize;
    predictors
        .iter()
        .map(|p| match p {
            Predictor::Single(name) => name.clone(),
            Predictor::Set(_) => {
                set_no += 1;
                format!("Set{set_no}")
            }
        })
        .collect()
}

/// Link function for generalized linear fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Identity,
    Logit,
    Log,
    Inverse,
    InverseSquare,
    NegativeBinomial,
}

impl LinkKind {
    pub fn display_name(self) -> &'static str {
        match self {
            LinkKind::Identity => "identity",
            LinkKind::Logit => "logit",
            LinkKind::Log => "log",
            LinkKind::Inverse => "inverse",
            LinkKind::InverseSquare => "inverse-square",
            LinkKind::NegativeBinomial => "negative-binomial",
        }
    }
}

/// Distribution family for generalized linear fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyKind {
    Normal,
    Bernoulli,
    Poisson,
    Gamma,
    InverseGaussian,
    NegativeBinomial,
}

impl FamilyKind {
    pub fn display_name(self) -> &'static str {
        match self {
            FamilyKind::Normal => "normal",
            FamilyKind::Bernoulli => "bernoulli",
            FamilyKind::Poisson => "poisson",
            FamilyKind::Gamma => "gamma",
            FamilyKind::InverseGaussian => "inverse-gaussian",
            FamilyKind::NegativeBinomial => "negative-binomial",
        }
    }
}

/// Pseudo-R² kind reported for generalized linear fits.
///
/// Ignored for plain linear fits, which always report R².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitStatKind {
    McFadden,
    Nagelkerke,
    CoxSnell,
}

impl FitStatKind {
    pub fn display_name(self) -> &'static str {
        match self {
            FitStatKind::McFadden => "McFadden",
            FitStatKind::Nagelkerke => "Nagelkerke",
            FitStatKind::CoxSnell => "Cox-Snell",
        }
    }
}

/// Configuration for one dominance run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DominanceOptions {
    /// Columns forced into every fitted model; excluded from the
    /// combinatorial analysis and from all dominance comparisons.
    pub covariates: Vec<String>,

    /// Pseudo-R² kind for generalized linear fits.
    pub fit_stat: FitStatKind,

    /// Link function. `None` (with no family) selects ordinary least squares.
    pub link: Option<LinkKind>,

    /// Distribution family. Defaults to the canonical family of `link`.
    pub family: Option<FamilyKind>,

    /// Optional per-row observation weights. Must match the dataset row
    /// count; rows with a missing (NaN) weight are dropped with the other
    /// incomplete rows.
    pub weights: Option<Vec<f64>>,

    /// Fit the subset models across a rayon worker pool.
    pub parallel: bool,

    /// Emit fitting progress to stderr. Controls progress emission only.
    pub verbose: bool,
}

impl Default for DominanceOptions {
    fn default() -> Self {
        Self {
            covariates: Vec::new(),
            fit_stat: FitStatKind::McFadden,
            link: None,
            family: None,
            weights: None,
            parallel: true,
            verbose: false,
        }
    }
}

/// One row of the fit-statistic table: a fitted subset and its statistic.
///
/// `cardinality` counts predictor units, not flattened member columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetFit {
    pub terms: Vec<String>,
    pub cardinality: usize,
    pub fit_stat: f64,
}

/// General dominance for one predictor unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralDominance {
    pub label: String,
    /// Average marginal contribution across all subset sizes.
    pub dominance: f64,
    /// Share of the summed general dominance; shares sum to 1.
    pub standardized: f64,
    /// 1-based ordinal rank by standardized share (1 = most important).
    /// Strict total order: ties are broken by input order.
    pub rank: usize,
}

/// Immutable snapshot of one dominance run.
///
/// Pure data: formatting and display belong to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominanceResult {
    /// Observations remaining after complete-case filtering.
    pub nobs: usize,
    /// Number of fitted subset models (`2^nvars - 1`).
    pub nregs: usize,
    pub outcome: String,
    pub predictors: Vec<Predictor>,
    /// Display labels aligned with `predictors`.
    pub labels: Vec<String>,
    pub covariates: Vec<String>,
    /// Fit statistic of the model containing every predictor unit.
    pub fit_overall: f64,
    /// Baseline statistic of the covariates-only (null) model.
    pub fit_null: f64,
    /// The full per-subset fit-statistic table.
    pub fs_table: Vec<SubsetFit>,
    /// Per-unit general dominance, standardized share, and rank.
    pub general: Vec<GeneralDominance>,
    /// `nvars x nvars` matrix: row p, column k holds the average marginal
    /// contribution of unit p at subset cardinality k (column 0 is the
    /// contribution over the covariates-only baseline).
    pub conditional: Vec<Vec<f64>>,
    /// Strict complete dominance: entry (i, j) is +1 when unit i's marginal
    /// contribution exceeds unit j's in every matched subset, -1 for the
    /// reverse, 0 otherwise. Antisymmetric.
    pub complete: Vec<Vec<i8>>,
    /// Proportion variant: entry (i, j) is the fraction of matched subsets
    /// in which unit i's contribution strictly exceeds unit j's.
    pub complete_proportion: Vec<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_names_cover_both_variants() {
        let single = Predictor::single("am");
        assert_eq!(single.member_names(), ["am".to_string()]);

        let set = Predictor::set(["carb", "wt"]);
        assert_eq!(set.member_names(), ["carb".to_string(), "wt".to_string()]);
    }

    #[test]
    fn set_labels_are_numbered_in_input_order() {
        let predictors = vec![
            Predictor::single("am"),
            Predictor::set(["carb", "wt"]),
            Predictor::single("cyl"),
            Predictor::set(["hp", "disp"]),
        ];
        assert_eq!(unit_labels(&predictors), ["am", "Set1", "cyl", "Set2"]);
    }
}
