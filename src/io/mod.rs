//! Result snapshot persistence.

pub mod result_file;

pub use result_file::*;
