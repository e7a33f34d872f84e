//! Centralized resource limits for the calling layer.

/// Maximum number of records read from a single FASTA file
pub const MAX_RECORDS: usize = 100_000;

/// Default cap on dynamic-programming cells, `(len1 + 1) * (len2 + 1)`
pub const DEFAULT_MAX_CELLS: u64 = 25_000_000;

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many records: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

/// Resource limit violations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "Sequences of length {len1} and {len2} need {cells} matrix cells, above the limit of {max_cells} (raise it with --max-cells)"
    )]
    MatrixTooLarge {
        len1: usize,
        len2: usize,
        cells: u64,
        max_cells: u64,
    },
}

/// Number of cells in a `(len1 + 1) x (len2 + 1)` matrix, saturating at `u64::MAX`
#[must_use]
pub fn matrix_cells(len1: usize, len2: usize) -> u64 {
    let rows = u64::try_from(len1).unwrap_or(u64::MAX).saturating_add(1);
    let cols = u64::try_from(len2).unwrap_or(u64::MAX).saturating_add(1);
    rows.saturating_mul(cols)
}

/// Reject sequence pairs whose DP matrices would exceed `max_cells`.
///
/// # Example
/// ```
/// use seq_aligner::utils::validation::check_matrix_size;
///
/// assert!(check_matrix_size(1_000, 1_000, 25_000_000).is_ok());
/// assert!(check_matrix_size(100_000, 100_000, 25_000_000).is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::MatrixTooLarge` when the pair is over the limit.
pub fn check_matrix_size(len1: usize, len2: usize, max_cells: u64) -> Result<(), ValidationError> {
    let cells = matrix_cells(len1, len2);
    if cells > max_cells {
        return Err(ValidationError::MatrixTooLarge {
            len1,
            len2,
            cells,
            max_cells,
        });
    }
    Ok(())
}
