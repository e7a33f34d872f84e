//! Smith-Waterman local alignment with multiple-alignment extraction.

use tracing::debug;

use crate::alignment::matrix::DpMatrix;
use crate::alignment::result::{AlignmentColumn, LocalAlignment};
use crate::core::error::{AlignError, Result};
use crate::core::scoring::ScoringModel;
use crate::core::sequence::Sequence;
use crate::core::types::{ColumnKind, GAP};

/// Default linear gap penalty for local alignment
pub const DEFAULT_LOCAL_GAP: i32 = -2;

/// Default minimum score of a reported local alignment
pub const DEFAULT_LOCAL_THRESHOLD: i32 = 10;

/// Parameters of a local alignment search
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LocalConfig {
    /// Score of every gap column (linear, zero or negative)
    pub gap: i32,
    /// Minimum score of a reported alignment (positive)
    pub threshold: i32,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            gap: DEFAULT_LOCAL_GAP,
            threshold: DEFAULT_LOCAL_THRESHOLD,
        }
    }
}

impl LocalConfig {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` for a positive gap or a threshold
    /// below 1.
    pub fn validate(&self) -> Result<()> {
        if self.gap > 0 {
            return Err(AlignError::InvalidConfiguration(format!(
                "local gap penalty must be zero or negative, got {}",
                self.gap
            )));
        }
        if self.threshold < 1 {
            return Err(AlignError::InvalidConfiguration(format!(
                "local alignment threshold must be at least 1, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Predecessor of a Smith-Waterman cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Stop,
    Diag,
    Up,
    Left,
}

/// Best predecessor of a cell with ties resolved diagonal, then up, then left.
/// Non-positive scores restart the alignment.
#[inline]
fn best_step(diag: i32, up: i32, left: i32) -> (i32, Step) {
    let mut best = (diag, Step::Diag);
    if up > best.0 {
        best = (up, Step::Up);
    }
    if left > best.0 {
        best = (left, Step::Left);
    }
    if best.0 <= 0 {
        (0, Step::Stop)
    } else {
        best
    }
}

/// Finds every well-separated local alignment scoring at least the threshold
pub struct LocalAligner<'a> {
    model: &'a ScoringModel,
    config: LocalConfig,
}

impl<'a> LocalAligner<'a> {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `config` is out of bounds or the
    /// model's substitution table is malformed.
    pub fn new(model: &'a ScoringModel, config: LocalConfig) -> Result<Self> {
        config.validate()?;
        model.matrix().validate()?;
        Ok(Self { model, config })
    }

    /// Local alignments of `seq1` against `seq2`, best first.
    ///
    /// An empty list means nothing reached the threshold.
    #[must_use]
    pub fn align(&self, seq1: &Sequence, seq2: &Sequence) -> Vec<LocalAlignment> {
        let a = seq1.as_bytes();
        let b = seq2.as_bytes();
        debug!(len1 = a.len(), len2 = b.len(), "Filling local alignment matrix");

        let (scores, steps) = self.fill(a, b);

        let mut candidates: Vec<(usize, usize, i32)> = scores
            .cells()
            .filter(|&(_, _, value)| value >= self.config.threshold)
            .collect();
        // Stable sort keeps row-major order among equal scores
        candidates.sort_by(|x, y| y.2.cmp(&x.2));
        debug!(candidates = candidates.len(), "Collected traceback candidates");

        let mut consumed = DpMatrix::new(scores.rows(), scores.cols(), false);
        let mut alignments = Vec::new();

        for (i, j, _) in candidates {
            if consumed.get(i, j) {
                continue;
            }
            let (columns, start1, start2) = self.traceback(&scores, &steps, &mut consumed, a, b, i, j);
            if let Some(alignment) = trim_to_matches(columns, start1, start2) {
                if alignment.score >= self.config.threshold {
                    alignments.push(alignment);
                }
            }
        }

        let mut alignments = remove_contained(alignments);
        alignments.sort_by(|x, y| {
            y.score
                .cmp(&x.score)
                .then(x.start1.cmp(&y.start1))
                .then(x.start2.cmp(&y.start2))
        });

        debug!(alignments = alignments.len(), "Local alignment complete");
        alignments
    }

    fn fill(&self, a: &[u8], b: &[u8]) -> (DpMatrix<i32>, DpMatrix<Step>) {
        let (m, n) = (a.len(), b.len());
        let gap = self.config.gap;
        let mut scores = DpMatrix::new(m + 1, n + 1, 0);
        let mut steps = DpMatrix::new(m + 1, n + 1, Step::Stop);

        for i in 1..=m {
            for j in 1..=n {
                let diag = scores.get(i - 1, j - 1) + self.model.score(a[i - 1], b[j - 1]);
                let up = scores.get(i - 1, j) + gap;
                let left = scores.get(i, j - 1) + gap;

                let (best, step) = best_step(diag, up, left);
                scores.set(i, j, best);
                steps.set(i, j, step);
            }
        }

        (scores, steps)
    }

    /// Trace back from `(i, j)` until a zero cell, the matrix edge, or a cell an
    /// earlier alignment already used. Returns columns in alignment order and the
    /// 0-based start in each sequence.
    #[allow(clippy::too_many_arguments)]
    fn traceback(
        &self,
        scores: &DpMatrix<i32>,
        steps: &DpMatrix<Step>,
        consumed: &mut DpMatrix<bool>,
        a: &[u8],
        b: &[u8],
        mut i: usize,
        mut j: usize,
    ) -> (Vec<AlignmentColumn>, usize, usize) {
        let gap = char::from(GAP);
        let mut reversed = Vec::new();

        while i > 0 && j > 0 && scores.get(i, j) > 0 && !consumed.get(i, j) {
            consumed.set(i, j, true);
            match steps.get(i, j) {
                Step::Diag => {
                    let (x, y) = (a[i - 1], b[j - 1]);
                    reversed.push(AlignmentColumn {
                        index: 0,
                        symbol1: char::from(x),
                        symbol2: char::from(y),
                        score: self.model.score(x, y),
                        kind: if x == y {
                            ColumnKind::Match
                        } else {
                            ColumnKind::Mismatch
                        },
                        terminal: false,
                    });
                    i -= 1;
                    j -= 1;
                }
                Step::Up => {
                    reversed.push(gap_column(char::from(a[i - 1]), gap, self.config.gap));
                    i -= 1;
                }
                Step::Left => {
                    reversed.push(gap_column(gap, char::from(b[j - 1]), self.config.gap));
                    j -= 1;
                }
                Step::Stop => break,
            }
        }

        reversed.reverse();
        (reversed, i, j)
    }
}

fn gap_column(symbol1: char, symbol2: char, score: i32) -> AlignmentColumn {
    AlignmentColumn {
        index: 0,
        symbol1,
        symbol2,
        score,
        kind: ColumnKind::GapOpen,
        terminal: false,
    }
}

/// Drop leading and trailing columns outside the first and last exact match, then
/// renumber columns and classify gap runs. Returns `None` when no match remains.
fn trim_to_matches(
    columns: Vec<AlignmentColumn>,
    start1: usize,
    start2: usize,
) -> Option<LocalAlignment> {
    let first = columns.iter().position(|c| c.kind == ColumnKind::Match)?;
    let last = columns.iter().rposition(|c| c.kind == ColumnKind::Match)?;
    let gap = char::from(GAP);

    let skipped1 = columns[..first].iter().filter(|c| c.symbol1 != gap).count();
    let skipped2 = columns[..first].iter().filter(|c| c.symbol2 != gap).count();

    let mut kept: Vec<AlignmentColumn> = columns[first..=last].to_vec();
    let mut previous: Option<AlignmentColumn> = None;
    for (index, column) in kept.iter_mut().enumerate() {
        column.index = index;
        if column.kind.is_gap() {
            let continues = previous.is_some_and(|p| {
                p.kind.is_gap() && (p.symbol1 == gap) == (column.symbol1 == gap)
            });
            column.kind = if continues {
                ColumnKind::GapExtend
            } else {
                ColumnKind::GapOpen
            };
        }
        previous = Some(*column);
    }

    Some(LocalAlignment::from_columns(
        kept,
        start1 + skipped1,
        start2 + skipped2,
    ))
}

/// Remove alignments whose aligned position pairs all appear in another alignment
/// scoring at least as much. Of two alignments with identical pairs, the earlier one
/// is kept.
fn remove_contained(alignments: Vec<LocalAlignment>) -> Vec<LocalAlignment> {
    let pairs: Vec<_> = alignments.iter().map(LocalAlignment::position_pairs).collect();

    let contained = |idx: usize| {
        pairs.iter().enumerate().any(|(other, other_pairs)| {
            other != idx
                && alignments[other].score >= alignments[idx].score
                && pairs[idx].is_subset(other_pairs)
                && (pairs[idx] != *other_pairs || other < idx)
        })
    };

    let keep: Vec<bool> = (0..alignments.len()).map(|idx| !contained(idx)).collect();
    let before = alignments.len();
    let kept: Vec<LocalAlignment> = alignments
        .into_iter()
        .zip(keep)
        .filter_map(|(alignment, keep)| keep.then_some(alignment))
        .collect();

    if kept.len() < before {
        debug!(removed = before - kept.len(), "Removed contained local alignments");
    }
    kept
}

/// Find all local alignments of `seq1` and `seq2` scoring at least
/// `config.threshold`
///
/// # Errors
///
/// See [`LocalAligner::new`].
pub fn find_local_alignments(
    seq1: &Sequence,
    seq2: &Sequence,
    model: &ScoringModel,
    config: &LocalConfig,
) -> Result<Vec<LocalAlignment>> {
    Ok(LocalAligner::new(model, *config)?.align(seq1, seq2))
}
