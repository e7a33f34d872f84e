use thiserror::Error;

/// Errors returned by the alignment and search entry points
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    /// Empty input, a symbol outside the alphabet, or a sequence too short for the
    /// requested window
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    /// Parameters outside their documented bounds
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An alignment failed its own post-condition checks. This is a bug; please
    /// report it together with the inputs that triggered it.
    #[error("Internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, AlignError>;
