//! Analysis orchestration.
//!
//! The run is a strict pipeline:
//!
//! 1. validate options and predictor structure (fail fast)
//! 2. complete-case filter the input columns (shared, read-only afterwards)
//! 3. enumerate and key every subset
//! 4. fit one model per subset (embarrassingly parallel; each worker owns
//!    exactly one output slot), joined before any aggregation
//! 5. derive contributions and the three dominance statistics
//! 6. assemble the immutable result snapshot
//!
//! There is no cancellation and no partial success: the call returns a
//! complete, internally consistent result or an error.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::data::frame::{Dataset, apply_mask};
use crate::domain::{
    DominanceOptions, DominanceResult, GeneralDominance, Predictor, SubsetFit, unit_labels,
};
use crate::dominance::aggregate::{
    complete_dominance, conditional_dominance, general_dominance, ordinal_ranks_desc,
    standardized_dominance,
};
use crate::dominance::contributions::compute_contributions;
use crate::dominance::subsets::{SubsetRecord, SubsetTable};
use crate::error::DominanceError;
use crate::fit::adapter::{Fitter, resolve_engine};

/// Run a dominance analysis.
///
/// With `options.verbose` set, fitting progress is emitted to stderr; the
/// emission is a side channel and never reorders or blocks fitting.
pub fn dominance(
    data: &Dataset,
    outcome: &str,
    predictors: &[Predictor],
    options: &DominanceOptions,
) -> Result<DominanceResult, DominanceError> {
    if options.verbose {
        dominance_with_progress(data, outcome, predictors, options, Some(&emit_progress))
    } else {
        dominance_with_progress(data, outcome, predictors, options, None)
    }
}

/// Run a dominance analysis with an explicit progress hook.
///
/// The hook is invoked as `progress(completed, total)` by whichever worker
/// finishes a subset model, with a counter local to this call.
pub fn dominance_with_progress(
    data: &Dataset,
    outcome: &str,
    predictors: &[Predictor],
    options: &DominanceOptions,
    progress: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> Result<DominanceResult, DominanceError> {
    validate_structure(outcome, predictors, &options.covariates)?;
    let engine = resolve_engine(options)?;

    // Complete-case filtering across every column the run touches.
    if let Some(weights) = &options.weights {
        if weights.len() != data.nrows() {
            return Err(DominanceError::InvalidData(format!(
                "Weight vector has {} entries for {} rows.",
                weights.len(),
                data.nrows()
            )));
        }
        if weights.iter().any(|&w| w < 0.0) {
            return Err(DominanceError::InvalidData(
                "Weights must be non-negative.".to_string(),
            ));
        }
    }

    let mut names: Vec<&str> = vec![outcome];
    names.extend(options.covariates.iter().map(String::as_str));
    for p in predictors {
        names.extend(p.member_names().iter().map(String::as_str));
    }
    let mask = data.complete_case_mask(&names, options.weights.as_deref())?;

    let nobs = mask.iter().filter(|&&keep| keep).count();
    if nobs == 0 {
        return Err(DominanceError::InvalidData(
            "No complete rows remain after dropping missing values.".to_string(),
        ));
    }

    let y = filtered(data, outcome, &mask)?;
    let weights = match &options.weights {
        Some(w) => apply_mask(w, &mask),
        None => vec![1.0; nobs],
    };
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(DominanceError::InvalidData(
            "Weights sum to zero over the complete rows.".to_string(),
        ));
    }

    let covariate_cols: Vec<Vec<f64>> = options
        .covariates
        .iter()
        .map(|name| filtered(data, name, &mask))
        .collect::<Result<_, _>>()?;
    let member_cols: Vec<Vec<Vec<f64>>> = predictors
        .iter()
        .map(|p| {
            p.member_names()
                .iter()
                .map(|name| filtered(data, name, &mask))
                .collect::<Result<_, _>>()
        })
        .collect::<Result<_, _>>()?;

    let fitter = Fitter::new(&y, &weights, engine)?;

    // Covariates-only baseline.
    let covariate_refs: Vec<&[f64]> = covariate_cols.iter().map(Vec::as_slice).collect();
    let fit_null = fitter.fit_statistic(&covariate_refs)?;

    // Enumerate and key the powerset, then fit. Each subset writes only its
    // own slot (order-preserving collect), so parallel completion order
    // cannot affect the output.
    let mut table = SubsetTable::build(predictors)?;
    let total = table.len();
    let completed = AtomicUsize::new(0);

    let fit_one = |record: &SubsetRecord| -> Result<f64, DominanceError> {
        let mut cols: Vec<&[f64]> = Vec::with_capacity(covariate_cols.len() + record.units.len());
        cols.extend(covariate_cols.iter().map(Vec::as_slice));
        for &unit in &record.units {
            cols.extend(member_cols[unit].iter().map(Vec::as_slice));
        }
        let stat = fitter.fit_statistic(&cols)?;
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress) = progress {
            progress(done, total);
        }
        Ok(stat)
    };

    let stats: Vec<f64> = if options.parallel {
        table.records().par_iter().map(fit_one).collect::<Result<_, _>>()?
    } else {
        table.records().iter().map(fit_one).collect::<Result<_, _>>()?
    };
    table.set_fit_stats(stats)?;

    // Global barrier reached: every lookup below spans the complete table.
    let nvars = predictors.len();
    let contribs = compute_contributions(&table, predictors, fit_null);
    let conditional = conditional_dominance(&table, &contribs, nvars);
    let general = general_dominance(&conditional);
    let standardized = standardized_dominance(&general);
    let ranks = ordinal_ranks_desc(&standardized);
    let (complete, complete_proportion) = complete_dominance(&table, &contribs, nvars);

    let labels = unit_labels(predictors);
    let general = labels
        .iter()
        .zip(&general)
        .zip(&standardized)
        .zip(&ranks)
        .map(|(((label, &dominance), &standardized), &rank)| GeneralDominance {
            label: label.clone(),
            dominance,
            standardized,
            rank,
        })
        .collect();

    let fs_table: Vec<SubsetFit> = table
        .records()
        .iter()
        .map(|record| SubsetFit {
            terms: record.units.iter().map(|&u| labels[u].clone()).collect(),
            cardinality: record.cardinality,
            fit_stat: record.fit_stat.unwrap_or(f64::NAN),
        })
        .collect();
    let fit_overall = table
        .records()
        .iter()
        .find(|r| r.cardinality == nvars)
        .and_then(|r| r.fit_stat)
        .unwrap_or(f64::NAN);

    Ok(DominanceResult {
        nobs,
        nregs: total,
        outcome: outcome.to_string(),
        predictors: predictors.to_vec(),
        labels,
        covariates: options.covariates.clone(),
        fit_overall,
        fit_null,
        fs_table,
        general,
        conditional,
        complete,
        complete_proportion,
    })
}

/// Reject structurally bad inputs before touching the data.
fn validate_structure(
    outcome: &str,
    predictors: &[Predictor],
    covariates: &[String],
) -> Result<(), DominanceError> {
    if predictors.is_empty() {
        return Err(DominanceError::InvalidData(
            "At least one predictor is required.".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    seen.insert(outcome);
    for covariate in covariates {
        if !seen.insert(covariate.as_str()) {
            return Err(DominanceError::InvalidData(format!(
                "Column '{covariate}' appears more than once across outcome and covariates."
            )));
        }
    }
    for predictor in predictors {
        let members = predictor.member_names();
        if members.is_empty() {
            return Err(DominanceError::InvalidData(
                "Predictor sets must contain at least one column.".to_string(),
            ));
        }
        for member in members {
            if !seen.insert(member.as_str()) {
                return Err(DominanceError::InvalidData(format!(
                    "Column '{member}' appears in more than one role; predictors, covariates, and the outcome must be disjoint."
                )));
            }
        }
    }
    Ok(())
}

fn filtered(data: &Dataset, name: &str, mask: &[bool]) -> Result<Vec<f64>, DominanceError> {
    data.filtered_column(name, mask).ok_or_else(|| {
        DominanceError::UnknownIdentifier(format!("Column '{name}' not found in the dataset."))
    })
}

/// Default stderr progress emitter: dots while fitting, a summary line at
/// the end.
fn emit_progress(done: usize, total: usize) {
    use std::io::Write;

    let step = (total / 50).max(1);
    if done % step == 0 {
        eprint!(".");
        let _ = std::io::stderr().flush();
    }
    if done == total {
        eprintln!(" {total} subset models fitted");
    }
}
