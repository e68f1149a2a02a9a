//! `dominance` library crate.
//!
//! Dominance analysis: rank predictors (or bundled predictor sets) by
//! relative importance by fitting every non-empty subset model and
//! aggregating the marginal fit-statistic contributions across subset
//! sizes.
//!
//! The crate is a plain in-process library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (report renderers, notebooks, services, ...)
//! - code stays easy to navigate as the project grows
//!
//! ```no_run
//! use dominance::{Dataset, DominanceOptions, Predictor};
//!
//! # fn main() -> Result<(), dominance::DominanceError> {
//! let data = Dataset::from_columns([
//!     ("mpg", vec![21.0, 22.8, 18.7]),
//!     ("am", vec![1.0, 1.0, 0.0]),
//!     ("cyl", vec![6.0, 4.0, 8.0]),
//! ])?;
//! let predictors = [Predictor::single("am"), Predictor::single("cyl")];
//! let result = dominance::dominance(&data, "mpg", &predictors, &DominanceOptions::default())?;
//! for g in &result.general {
//!     println!("{}: {:.4} (rank {})", g.label, g.standardized, g.rank);
//! }
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod domain;
pub mod dominance;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;

pub use crate::data::frame::Dataset;
pub use crate::domain::{
    DominanceOptions, DominanceResult, FamilyKind, FitStatKind, GeneralDominance, LinkKind,
    Predictor, SubsetFit,
};
pub use crate::dominance::analysis::{dominance, dominance_with_progress};
pub use crate::error::DominanceError;
