//! Exact diagonal-run matching for dotplots.
//!
//! Every cell `(i, j)` with `seq1[i] == seq2[j]` is a hit. Hits on the same
//! diagonal with no gap between them form a [`DiagonalRun`]; runs shorter than the
//! minimum length are dropped. Nucleotide sequences are also matched against the
//! reverse complement of the second sequence.

use serde::Serialize;
use tracing::debug;

use crate::alignment::matrix::DpMatrix;
use crate::core::diagonal::DiagonalRun;
use crate::core::error::{AlignError, Result};
use crate::core::sequence::Sequence;
use crate::core::types::Orientation;

/// Default minimum length of a reported run
pub const DEFAULT_MIN_RUN_LENGTH: usize = 4;

/// Diagonal runs of one sequence pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dotplot {
    pub len1: usize,
    pub len2: usize,
    /// Runs against the second sequence as given
    pub forward: Vec<DiagonalRun>,
    /// Runs against the reverse complement of the second sequence; empty for protein
    pub reverse: Vec<DiagonalRun>,
}

impl Dotplot {
    /// Forward and reverse runs together
    pub fn runs(&self) -> impl Iterator<Item = &DiagonalRun> {
        self.forward.iter().chain(self.reverse.iter())
    }

    /// Longest run in either orientation
    #[must_use]
    pub fn longest(&self) -> Option<&DiagonalRun> {
        self.runs().max_by_key(|run| run.length)
    }
}

/// Traces maximal exact-match runs along diagonals
#[derive(Debug, Clone, Copy)]
pub struct DiagonalMatcher {
    min_run_length: usize,
}

impl DiagonalMatcher {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `min_run_length` is zero.
    pub fn new(min_run_length: usize) -> Result<Self> {
        if min_run_length == 0 {
            return Err(AlignError::InvalidConfiguration(
                "minimum run length must be at least 1".to_string(),
            ));
        }
        Ok(Self { min_run_length })
    }

    /// Runs of `a` against `b` in row-major order of their first cell
    #[must_use]
    pub fn runs(&self, a: &[u8], b: &[u8], orientation: Orientation) -> Vec<DiagonalRun> {
        let (rows, cols) = (a.len(), b.len());
        let mut hits = DpMatrix::new(rows, cols, false);
        for (i, &x) in a.iter().enumerate() {
            for (j, &y) in b.iter().enumerate() {
                hits.set(i, j, x.eq_ignore_ascii_case(&y));
            }
        }

        let mut visited = DpMatrix::new(rows, cols, false);
        let mut runs = Vec::new();

        for i in 0..rows {
            for j in 0..cols {
                if !hits.get(i, j) || visited.get(i, j) {
                    continue;
                }

                let (mut start1, mut start2) = (i, j);
                while start1 > 0 && start2 > 0 && hits.get(start1 - 1, start2 - 1) {
                    start1 -= 1;
                    start2 -= 1;
                }

                let mut length = 0;
                while start1 + length < rows
                    && start2 + length < cols
                    && hits.get(start1 + length, start2 + length)
                {
                    visited.set(start1 + length, start2 + length, true);
                    length += 1;
                }

                if length >= self.min_run_length {
                    runs.push(DiagonalRun::new(start1, start2, length, orientation));
                }
            }
        }

        runs
    }

    /// Forward runs, plus reverse-complement runs when `seq2` is a nucleotide
    /// sequence
    #[must_use]
    pub fn dotplot(&self, seq1: &Sequence, seq2: &Sequence) -> Dotplot {
        let forward = self.runs(seq1.as_bytes(), seq2.as_bytes(), Orientation::Forward);

        // Protein sequences have no complement
        let reverse = seq2
            .reverse_complement()
            .map(|reversed| {
                self.runs(
                    seq1.as_bytes(),
                    reversed.as_bytes(),
                    Orientation::ReverseComplement,
                )
            })
            .unwrap_or_default();

        debug!(
            len1 = seq1.len(),
            len2 = seq2.len(),
            forward = forward.len(),
            reverse = reverse.len(),
            min_run_length = self.min_run_length,
            "Traced diagonal runs"
        );

        Dotplot {
            len1: seq1.len(),
            len2: seq2.len(),
            forward,
            reverse,
        }
    }
}

/// Diagonal runs of at least `min_run_length` between `seq1` and `seq2`
///
/// # Errors
///
/// Returns `AlignError::InvalidConfiguration` if `min_run_length` is zero.
pub fn build_dotplot(seq1: &Sequence, seq2: &Sequence, min_run_length: usize) -> Result<Dotplot> {
    Ok(DiagonalMatcher::new(min_run_length)?.dotplot(seq1, seq2))
}
