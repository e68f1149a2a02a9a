//! In-memory tabular input and synthetic sample generation.

pub mod frame;
pub mod sample;

pub use frame::*;
pub use sample::*;
