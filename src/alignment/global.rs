//! Gotoh global alignment with affine gaps and a per-position terminal gap penalty.

use tracing::{debug, error, warn};

use crate::alignment::matrix::DpMatrix;
use crate::alignment::result::{aligned_strings, strip_gaps, AlignmentColumn, AlignmentResult};
use crate::core::error::{AlignError, Result};
use crate::core::scoring::{GapPenalties, ScoringModel};
use crate::core::sequence::Sequence;
use crate::core::types::{ColumnKind, GAP};

/// Stand-in for minus infinity that survives adding a few penalties
const NEG_INF: i32 = i32::MIN / 4;

/// Which of the three matrices a cell value lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Residue against residue
    M,
    /// First-sequence residue against a gap
    Ix,
    /// Second-sequence residue against a gap
    Iy,
}

/// Best of the three states with ties resolved M, then Ix, then Iy
#[inline]
fn best_state(m: i32, ix: i32, iy: i32) -> (i32, State) {
    let mut best = (m, State::M);
    if ix > best.0 {
        best = (ix, State::Ix);
    }
    if iy > best.0 {
        best = (iy, State::Iy);
    }
    best
}

/// Opening a gap wins ties against extending one
#[inline]
fn best_gap(open: i32, extend: i32, extend_state: State) -> (i32, State) {
    if open >= extend {
        (open, State::M)
    } else {
        (extend, extend_state)
    }
}

/// Score of a gap column, including the end-gap penalty for terminal columns
#[inline]
fn gap_column_score(gaps: GapPenalties, opens: bool, terminal: bool) -> i32 {
    let base = if opens { gaps.open } else { gaps.extend };
    if terminal {
        base + gaps.end_gap
    } else {
        base
    }
}

/// Filled score and traceback matrices for one sequence pair
struct GotohMatrices {
    m: DpMatrix<i32>,
    ix: DpMatrix<i32>,
    iy: DpMatrix<i32>,
    tb_m: DpMatrix<State>,
    tb_ix: DpMatrix<State>,
    tb_iy: DpMatrix<State>,
}

/// End-to-end aligner.
///
/// Terminal gaps pay `end_gap` on top of their open/extend penalty at every
/// position of the run, at both ends of the alignment. A gap column that consumes
/// a first-sequence residue is terminal when the second sequence has not started
/// yet or is already finished, and vice versa.
pub struct GlobalAligner<'a> {
    model: &'a ScoringModel,
}

impl<'a> GlobalAligner<'a> {
    #[must_use]
    pub fn new(model: &'a ScoringModel) -> Self {
        Self { model }
    }

    /// Align `seq1` against `seq2` end to end
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if the scoring model carries a
    /// positive gap penalty, or `AlignError::InternalInvariantViolation` if the
    /// traceback fails its round-trip or score checks.
    pub fn align(&self, seq1: &Sequence, seq2: &Sequence) -> Result<AlignmentResult> {
        self.model.validate_config()?;

        let a = seq1.as_bytes();
        let b = seq2.as_bytes();
        debug!(len1 = a.len(), len2 = b.len(), "Filling global alignment matrices");

        let matrices = self.fill(a, b);
        let (m, n) = (a.len(), b.len());
        let (score, state) = best_state(
            matrices.m.get(m, n),
            matrices.ix.get(m, n),
            matrices.iy.get(m, n),
        );

        let (columns, padded) = self.traceback(&matrices, a, b, state);
        let column_total: i32 = columns.iter().map(|c| c.score).sum();
        let (aligned1, aligned2) = aligned_strings(&columns);

        let round_trip =
            strip_gaps(&aligned1).as_bytes() == a && strip_gaps(&aligned2).as_bytes() == b;
        debug_assert!(round_trip, "gap-stripped alignment differs from its inputs");
        if !round_trip {
            error!(len1 = m, len2 = n, "Global alignment failed round-trip check");
            return Err(AlignError::InternalInvariantViolation(format!(
                "gap-stripped alignment does not reproduce the inputs (lengths {m} and {n})"
            )));
        }

        let score = if padded {
            column_total
        } else {
            debug_assert_eq!(column_total, score, "column scores do not sum to DP score");
            if column_total != score {
                error!(
                    dp_score = score,
                    column_total, "Global alignment failed score consistency check"
                );
                return Err(AlignError::InternalInvariantViolation(format!(
                    "column scores sum to {column_total} but the matrix optimum is {score}"
                )));
            }
            score
        };

        debug!(score, columns = columns.len(), "Global alignment complete");

        Ok(AlignmentResult {
            aligned1,
            aligned2,
            score,
            columns,
        })
    }

    fn fill(&self, a: &[u8], b: &[u8]) -> GotohMatrices {
        let (m, n) = (a.len(), b.len());
        let gaps = self.model.gap_parameters();

        let mut mat = GotohMatrices {
            m: DpMatrix::new(m + 1, n + 1, NEG_INF),
            ix: DpMatrix::new(m + 1, n + 1, NEG_INF),
            iy: DpMatrix::new(m + 1, n + 1, NEG_INF),
            tb_m: DpMatrix::new(m + 1, n + 1, State::M),
            tb_ix: DpMatrix::new(m + 1, n + 1, State::M),
            tb_iy: DpMatrix::new(m + 1, n + 1, State::M),
        };
        mat.m.set(0, 0, 0);

        for i in 0..=m {
            for j in 0..=n {
                if i > 0 && j > 0 {
                    let (best, from) = best_state(
                        mat.m.get(i - 1, j - 1),
                        mat.ix.get(i - 1, j - 1),
                        mat.iy.get(i - 1, j - 1),
                    );
                    let sub = self.model.score(a[i - 1], b[j - 1]);
                    mat.m.set(i, j, best.saturating_add(sub));
                    mat.tb_m.set(i, j, from);
                }

                if i > 0 {
                    let open = mat.m.get(i - 1, j).saturating_add(gaps.open);
                    let extend = mat.ix.get(i - 1, j).saturating_add(gaps.extend);
                    let (best, from) = best_gap(open, extend, State::Ix);
                    let end = if j == 0 || j == n { gaps.end_gap } else { 0 };
                    mat.ix.set(i, j, best.saturating_add(end));
                    mat.tb_ix.set(i, j, from);
                }

                if j > 0 {
                    let open = mat.m.get(i, j - 1).saturating_add(gaps.open);
                    let extend = mat.iy.get(i, j - 1).saturating_add(gaps.extend);
                    let (best, from) = best_gap(open, extend, State::Iy);
                    let end = if i == 0 || i == m { gaps.end_gap } else { 0 };
                    mat.iy.set(i, j, best.saturating_add(end));
                    mat.tb_iy.set(i, j, from);
                }
            }
        }

        mat
    }

    /// Walk predecessor pointers from `(m, n)` back to the origin.
    ///
    /// Returns the columns in alignment order and whether the gap-padding fallback
    /// had to complete the path.
    fn traceback(
        &self,
        mat: &GotohMatrices,
        a: &[u8],
        b: &[u8],
        final_state: State,
    ) -> (Vec<AlignmentColumn>, bool) {
        let (m, n) = (a.len(), b.len());
        let gaps = self.model.gap_parameters();
        let gap = char::from(GAP);

        let mut reversed = Vec::with_capacity(m + n);
        let (mut i, mut j, mut state) = (m, n, final_state);

        while i > 0 || j > 0 {
            match state {
                State::M if i > 0 && j > 0 => {
                    let (x, y) = (a[i - 1], b[j - 1]);
                    let kind = if x == y {
                        ColumnKind::Match
                    } else {
                        ColumnKind::Mismatch
                    };
                    reversed.push(AlignmentColumn {
                        index: 0,
                        symbol1: char::from(x),
                        symbol2: char::from(y),
                        score: self.model.score(x, y),
                        kind,
                        terminal: false,
                    });
                    state = mat.tb_m.get(i, j);
                    i -= 1;
                    j -= 1;
                }
                State::Ix if i > 0 => {
                    let from = mat.tb_ix.get(i, j);
                    let opens = from == State::M;
                    let terminal = j == 0 || j == n;
                    reversed.push(AlignmentColumn {
                        index: 0,
                        symbol1: char::from(a[i - 1]),
                        symbol2: gap,
                        score: gap_column_score(gaps, opens, terminal),
                        kind: if opens {
                            ColumnKind::GapOpen
                        } else {
                            ColumnKind::GapExtend
                        },
                        terminal,
                    });
                    state = from;
                    i -= 1;
                }
                State::Iy if j > 0 => {
                    let from = mat.tb_iy.get(i, j);
                    let opens = from == State::M;
                    let terminal = i == 0 || i == m;
                    reversed.push(AlignmentColumn {
                        index: 0,
                        symbol1: gap,
                        symbol2: char::from(b[j - 1]),
                        score: gap_column_score(gaps, opens, terminal),
                        kind: if opens {
                            ColumnKind::GapOpen
                        } else {
                            ColumnKind::GapExtend
                        },
                        terminal,
                    });
                    state = from;
                    j -= 1;
                }
                _ => break,
            }
        }

        let padded = i > 0 || j > 0;
        if padded {
            warn!(
                remaining1 = i,
                remaining2 = j,
                "Traceback stopped before the origin, padding the prefix with gaps"
            );
            // Leading gap runs, built right to left: the last pushed column opens
            for k in (0..j).rev() {
                reversed.push(AlignmentColumn {
                    index: 0,
                    symbol1: gap,
                    symbol2: char::from(b[k]),
                    score: gap_column_score(gaps, k == 0, true),
                    kind: if k == 0 {
                        ColumnKind::GapOpen
                    } else {
                        ColumnKind::GapExtend
                    },
                    terminal: true,
                });
            }
            for k in (0..i).rev() {
                reversed.push(AlignmentColumn {
                    index: 0,
                    symbol1: char::from(a[k]),
                    symbol2: gap,
                    score: gap_column_score(gaps, k == 0, true),
                    kind: if k == 0 {
                        ColumnKind::GapOpen
                    } else {
                        ColumnKind::GapExtend
                    },
                    terminal: true,
                });
            }
        }

        reversed.reverse();
        for (index, column) in reversed.iter_mut().enumerate() {
            column.index = index;
        }

        (reversed, padded)
    }
}

/// Align two sequences end to end with Gotoh's algorithm
///
/// # Errors
///
/// See [`GlobalAligner::align`].
pub fn align_global(
    seq1: &Sequence,
    seq2: &Sequence,
    model: &ScoringModel,
) -> Result<AlignmentResult> {
    GlobalAligner::new(model).align(seq1, seq2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::Alphabet;

    fn dna(text: &str) -> Sequence {
        Sequence::new(text, Alphabet::Dna).unwrap()
    }

    fn model() -> ScoringModel {
        ScoringModel::uniform(
            2,
            -1,
            GapPenalties {
                open: -3,
                extend: -1,
                end_gap: -1,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_identical_sequences() {
        let result = align_global(&dna("ATCG"), &dna("ATCG"), &model()).unwrap();
        assert_eq!(result.aligned1, "ATCG");
        assert_eq!(result.aligned2, "ATCG");
        assert_eq!(result.score, 8);
        assert!(result.columns.iter().all(|c| c.kind == ColumnKind::Match));
    }

    #[test]
    fn test_single_mismatch() {
        let result = align_global(&dna("ATCGATCG"), &dna("ATCAATCG"), &model()).unwrap();
        assert_eq!(result.aligned1, "ATCGATCG");
        assert_eq!(result.aligned2, "ATCAATCG");
        assert_eq!(result.score, 13);
        for column in &result.columns {
            if column.index == 3 {
                assert_eq!(column.kind, ColumnKind::Mismatch);
                assert_eq!(column.score, -1);
            } else {
                assert_eq!(column.kind, ColumnKind::Match);
            }
        }
    }

    #[test]
    fn test_internal_gap_open_and_extend() {
        // Deleting "TT" from the middle: 7 matches, one open, one extend
        let result = align_global(&dna("ACGTTTGCA"), &dna("ACGTGCA"), &model()).unwrap();
        assert_eq!(strip_gaps(&result.aligned1), "ACGTTTGCA");
        assert_eq!(strip_gaps(&result.aligned2), "ACGTGCA");
        let stats = result.stats();
        assert_eq!(stats.matches, 7);
        assert_eq!(stats.gaps, 2);
        assert_eq!(stats.gap_opens, 1);
        assert_eq!(result.score, 7 * 2 - 3 - 1);
        assert!(result.columns.iter().all(|c| !c.terminal));
    }

    #[test]
    fn test_terminal_gap_penalty_applies_per_position() {
        // Query is longer by two residues at the end; the trailing run pays end_gap twice
        let result = align_global(&dna("ACGTAC"), &dna("ACGT"), &model()).unwrap();
        assert_eq!(result.aligned1, "ACGTAC");
        assert_eq!(result.aligned2, "ACGT--");
        assert_eq!(result.score, 4 * 2 + (-3 - 1) + (-1 - 1));

        let trailing: Vec<_> = result.columns.iter().filter(|c| c.terminal).collect();
        assert_eq!(trailing.len(), 2);
        assert_eq!(trailing[0].kind, ColumnKind::GapOpen);
        assert_eq!(trailing[1].kind, ColumnKind::GapExtend);
    }

    #[test]
    fn test_leading_gap_is_terminal() {
        let result = align_global(&dna("GGACGT"), &dna("ACGT"), &model()).unwrap();
        assert_eq!(result.aligned1, "GGACGT");
        assert_eq!(result.aligned2, "--ACGT");
        assert!(result.columns[0].terminal);
        assert!(result.columns[1].terminal);
        assert_eq!(result.score, 4 * 2 + (-3 - 1) + (-1 - 1));
    }

    #[test]
    fn test_state_ties_prefer_m_then_ix() {
        assert_eq!(best_state(1, 1, 1), (1, State::M));
        assert_eq!(best_state(0, 1, 1), (1, State::Ix));
        assert_eq!(best_state(0, 0, 1), (1, State::Iy));
    }

    #[test]
    fn test_gap_ties_prefer_opening() {
        assert_eq!(best_gap(-4, -4, State::Ix), (-4, State::M));
        assert_eq!(best_gap(-5, -4, State::Iy), (-4, State::Iy));
    }

    #[test]
    fn test_tied_optimum_ends_in_m() {
        // "AA"/"-A" and "AA"/"A-" both score -2; the final M cell wins the tie
        let result = align_global(&dna("AA"), &dna("A"), &model()).unwrap();
        assert_eq!(result.aligned1, "AA");
        assert_eq!(result.aligned2, "-A");
        assert_eq!(result.score, -2);
        assert_eq!(result.columns[0].kind, ColumnKind::GapOpen);
        assert!(result.columns[0].terminal);
        assert_eq!(result.columns[1].kind, ColumnKind::Match);
    }

    #[test]
    fn test_column_scores_sum_to_total() {
        let result = align_global(&dna("GATTACAGATTACA"), &dna("GATCACATTACA"), &model()).unwrap();
        let total: i32 = result.columns.iter().map(|c| c.score).sum();
        assert_eq!(total, result.score);
        assert_eq!(result.aligned1.len(), result.aligned2.len());
    }

    #[test]
    fn test_completely_different_lengths() {
        let result = align_global(&dna("A"), &dna("CCCCCC"), &model()).unwrap();
        assert_eq!(strip_gaps(&result.aligned1), "A");
        assert_eq!(strip_gaps(&result.aligned2), "CCCCCC");
        assert_eq!(result.aligned1.len(), result.aligned2.len());
    }

    #[test]
    fn test_rejects_positive_gap_penalty_from_deserialized_model() {
        let mut value = serde_json::to_value(ScoringModel::default()).unwrap();
        value["gaps"]["open"] = serde_json::json!(5);
        let model: ScoringModel = serde_json::from_value(value).unwrap();
        let err = align_global(&dna("ACGT"), &dna("ACGT"), &model).unwrap_err();
        assert!(matches!(err, AlignError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_short_deserialized_matrix_is_an_error_not_a_panic() {
        let json = r#"{
            "matrix": { "name": "x", "scores": [] },
            "gaps": { "open": -3, "extend": -1, "end_gap": 0 }
        }"#;
        let err = serde_json::from_str::<ScoringModel>(json).unwrap_err();
        assert!(err.to_string().contains("substitution matrix 'x'"));
    }

    #[test]
    fn test_protein_alignment_with_blosum62() {
        let model = ScoringModel::blosum62(GapPenalties {
            open: -11,
            extend: -1,
            end_gap: 0,
        })
        .unwrap();
        let s1 = Sequence::new("HEAGAWGHEE", Alphabet::Protein).unwrap();
        let s2 = Sequence::new("PAWHEAE", Alphabet::Protein).unwrap();
        let result = align_global(&s1, &s2, &model).unwrap();
        assert_eq!(strip_gaps(&result.aligned1), "HEAGAWGHEE");
        assert_eq!(strip_gaps(&result.aligned2), "PAWHEAE");
        let total: i32 = result.columns.iter().map(|c| c.score).sum();
        assert_eq!(total, result.score);
    }
}
