//! Dominance analysis engine.
//!
//! Responsibilities:
//!
//! - enumerate every non-empty subset of the predictor units
//! - fit one model per subset (parallel) and key the statistics canonically
//! - reduce marginal contributions into complete, conditional, and general
//!   dominance plus a standardized ranking

pub mod aggregate;
pub mod analysis;
pub mod contributions;
pub mod subsets;

pub use aggregate::*;
pub use analysis::*;
pub use contributions::*;
pub use subsets::*;
