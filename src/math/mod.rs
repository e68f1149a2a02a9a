//! Numerical routines shared by the fitting adapter.

pub mod glm;
pub mod ols;

pub use glm::*;
pub use ols::*;
