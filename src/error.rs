/// Crate-wide error type.
///
/// Variants mirror the failure taxonomy of the analysis:
///
/// - `InvalidOption`: an unsupported option combination, rejected before any
///   fitting starts.
/// - `UnknownIdentifier`: an outcome/predictor/covariate name that is not a
///   column of the input dataset.
/// - `InvalidData`: structurally bad input (length mismatches, overlapping
///   predictor names, empty data after complete-case filtering, ...).
/// - `FitFailure`: the fitting routine failed for some subset (singular
///   design, IRLS non-convergence, non-finite statistic). Fatal: the run
///   either returns a complete result or nothing.
/// - `Io`: a result-snapshot read/write failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DominanceError {
    InvalidOption(String),
    UnknownIdentifier(String),
    InvalidData(String),
    FitFailure(String),
    Io(String),
}

impl std::fmt::Display for DominanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DominanceError::InvalidOption(msg) => write!(f, "Invalid option: {msg}"),
            DominanceError::UnknownIdentifier(msg) => write!(f, "Unknown identifier: {msg}"),
            DominanceError::InvalidData(msg) => write!(f, "Invalid data: {msg}"),
            DominanceError::FitFailure(msg) => write!(f, "Fit failure: {msg}"),
            DominanceError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for DominanceError {}
