//! Model fitting adapter.
//!
//! Responsibilities:
//!
//! - resolve the requested link/family/fit-statistic options into a concrete
//!   fitting engine (fail fast on unsupported combinations)
//! - fit one subset model and return its scalar fit statistic
//!   (R² for least squares, pseudo-R² for generalized linear fits)

pub mod adapter;

pub use adapter::*;
