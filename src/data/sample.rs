//! Deterministic synthetic dataset generation.
//!
//! Used by tests and demos that need a dataset with a known generating
//! process (e.g. a logistic response with unequal survey weights). All
//! randomness flows through a seeded `StdRng`, so a given seed always
//! produces the same dataset.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::frame::Dataset;
use crate::error::DominanceError;

/// A generated dataset plus the per-row weights drawn for it.
#[derive(Debug, Clone)]
pub struct SampleData {
    pub data: Dataset,
    pub weights: Vec<f64>,
}

/// Generate a linear-response sample: three correlated predictors and
/// `y = 1 + 1.5 x1 + 0.8 x2 - 0.5 x3 + noise`.
pub fn generate_linear_sample(n: usize, seed: u64) -> Result<SampleData, DominanceError> {
    generate(n, seed, false)
}

/// Generate a binary-response sample suitable for logistic fits:
/// `P(y = 1) = logistic(0.3 + 1.2 x1 + 0.7 x2 - 0.9 x3)`.
pub fn generate_logistic_sample(n: usize, seed: u64) -> Result<SampleData, DominanceError> {
    generate(n, seed, true)
}

fn generate(n: usize, seed: u64, binary: bool) -> Result<SampleData, DominanceError> {
    if n == 0 {
        return Err(DominanceError::InvalidData(
            "Sample size must be > 0.".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| DominanceError::InvalidData(format!("Noise distribution error: {e}")))?;

    let mut x1 = Vec::with_capacity(n);
    let mut x2 = Vec::with_capacity(n);
    let mut x3 = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for _ in 0..n {
        let z: f64 = normal.sample(&mut rng);
        // Correlate the predictors through the shared component z so that
        // the dominance levels differ (orthogonal predictors make every
        // conditional level identical, which is a poor test fixture).
        let v1 = 0.8 * z + 0.6 * normal.sample(&mut rng);
        let v2 = 0.5 * z + 0.9 * normal.sample(&mut rng);
        let v3: f64 = normal.sample(&mut rng);

        let response = if binary {
            let eta = 0.3 + 1.2 * v1 + 0.7 * v2 - 0.9 * v3;
            let p = 1.0 / (1.0 + (-eta).exp());
            let u: f64 = rng.gen_range(0.0..1.0);
            if u < p { 1.0 } else { 0.0 }
        } else {
            1.0 + 1.5 * v1 + 0.8 * v2 - 0.5 * v3 + normal.sample(&mut rng)
        };

        x1.push(v1);
        x2.push(v2);
        x3.push(v3);
        y.push(response);
        weights.push(rng.gen_range(0.5..2.0));
    }

    let data = Dataset::from_columns([("y", y), ("x1", x1), ("x2", x2), ("x3", x3)])?;
    Ok(SampleData { data, weights })
}
