use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::diagonal::DiagonalRun;
use crate::core::types::{percent, ColumnKind, Orientation, GAP};

/// One column of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlignmentColumn {
    /// 0-based column index within the alignment
    pub index: usize,
    /// Residue of the first sequence, or `-`
    pub symbol1: char,
    /// Residue of the second sequence, or `-`
    pub symbol2: char,
    /// This column's contribution to the alignment score
    pub score: i32,
    pub kind: ColumnKind,
    /// Gap column belonging to a run that touches either end of a global alignment
    pub terminal: bool,
}

/// Summary counts over the columns of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentStats {
    pub columns: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub gaps: usize,
    pub gap_opens: usize,
    /// Percentage of columns that are exact matches
    pub identity: f64,
}

impl AlignmentStats {
    #[must_use]
    pub fn from_columns(columns: &[AlignmentColumn]) -> Self {
        let mut stats = Self {
            columns: columns.len(),
            matches: 0,
            mismatches: 0,
            gaps: 0,
            gap_opens: 0,
            identity: 0.0,
        };

        for column in columns {
            match column.kind {
                ColumnKind::Match => stats.matches += 1,
                ColumnKind::Mismatch => stats.mismatches += 1,
                ColumnKind::GapOpen => {
                    stats.gaps += 1;
                    stats.gap_opens += 1;
                }
                ColumnKind::GapExtend => stats.gaps += 1,
            }
        }

        stats.identity = percent(stats.matches, stats.columns);
        stats
    }
}

/// Result of a global (end-to-end) alignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentResult {
    /// First sequence with gaps inserted
    pub aligned1: String,
    /// Second sequence with gaps inserted, same length as `aligned1`
    pub aligned2: String,
    /// Total alignment score
    pub score: i32,
    /// Per-column score breakdown
    pub columns: Vec<AlignmentColumn>,
}

impl AlignmentResult {
    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> AlignmentStats {
        AlignmentStats::from_columns(&self.columns)
    }

    /// Exact-match blocks of the alignment as diagonal runs
    #[must_use]
    pub fn blocks(&self) -> Vec<DiagonalRun> {
        match_blocks(&self.columns, 0, 0)
    }

    /// Conventional `|` / `.` / space line drawn between the two aligned rows
    #[must_use]
    pub fn midline(&self) -> String {
        midline(&self.columns)
    }
}

/// One local alignment found by the Smith-Waterman search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalAlignment {
    pub aligned1: String,
    pub aligned2: String,
    pub score: i32,
    /// Half-open range covered in the first sequence
    pub start1: usize,
    pub end1: usize,
    /// Half-open range covered in the second sequence
    pub start2: usize,
    pub end2: usize,
    /// Percentage of columns that are exact matches
    pub identity: f64,
    pub columns: Vec<AlignmentColumn>,
}

impl LocalAlignment {
    /// Assemble a local alignment from its columns and start coordinates
    pub(crate) fn from_columns(columns: Vec<AlignmentColumn>, start1: usize, start2: usize) -> Self {
        let (aligned1, aligned2) = aligned_strings(&columns);
        let residues1 = columns.iter().filter(|c| c.symbol1 != char::from(GAP)).count();
        let residues2 = columns.iter().filter(|c| c.symbol2 != char::from(GAP)).count();
        let score = columns.iter().map(|c| c.score).sum();
        let identity = AlignmentStats::from_columns(&columns).identity;

        Self {
            aligned1,
            aligned2,
            score,
            start1,
            end1: start1 + residues1,
            start2,
            end2: start2 + residues2,
            identity,
            columns,
        }
    }

    /// Every `(pos1, pos2)` pair aligned residue-to-residue (no gap on either side),
    /// in 0-based sequence coordinates
    #[must_use]
    pub fn position_pairs(&self) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        let (mut pos1, mut pos2) = (self.start1, self.start2);
        for column in &self.columns {
            let gap1 = column.symbol1 == char::from(GAP);
            let gap2 = column.symbol2 == char::from(GAP);
            if !gap1 && !gap2 {
                pairs.insert((pos1, pos2));
            }
            if !gap1 {
                pos1 += 1;
            }
            if !gap2 {
                pos2 += 1;
            }
        }
        pairs
    }

    #[must_use]
    pub fn stats(&self) -> AlignmentStats {
        AlignmentStats::from_columns(&self.columns)
    }

    /// Exact-match blocks of the alignment as diagonal runs in sequence coordinates
    #[must_use]
    pub fn blocks(&self) -> Vec<DiagonalRun> {
        match_blocks(&self.columns, self.start1, self.start2)
    }

    #[must_use]
    pub fn midline(&self) -> String {
        midline(&self.columns)
    }
}

/// Render both aligned rows of a column list
pub(crate) fn aligned_strings(columns: &[AlignmentColumn]) -> (String, String) {
    columns
        .iter()
        .map(|c| (c.symbol1, c.symbol2))
        .unzip()
}

/// Remove gap symbols from an aligned row
#[must_use]
pub fn strip_gaps(aligned: &str) -> String {
    aligned.chars().filter(|&c| c != char::from(GAP)).collect()
}

fn midline(columns: &[AlignmentColumn]) -> String {
    columns
        .iter()
        .map(|c| match c.kind {
            ColumnKind::Match => '|',
            ColumnKind::Mismatch => '.',
            ColumnKind::GapOpen | ColumnKind::GapExtend => ' ',
        })
        .collect()
}

/// Collapse consecutive match columns into forward diagonal runs
fn match_blocks(columns: &[AlignmentColumn], start1: usize, start2: usize) -> Vec<DiagonalRun> {
    let mut blocks = Vec::new();
    let (mut pos1, mut pos2) = (start1, start2);
    let mut open: Option<DiagonalRun> = None;

    for column in columns {
        if column.kind == ColumnKind::Match {
            match open.as_mut() {
                Some(run) => run.length += 1,
                None => open = Some(DiagonalRun::new(pos1, pos2, 1, Orientation::Forward)),
            }
        } else if let Some(run) = open.take() {
            blocks.push(run);
        }

        if column.symbol1 != char::from(GAP) {
            pos1 += 1;
        }
        if column.symbol2 != char::from(GAP) {
            pos2 += 1;
        }
    }

    blocks.extend(open);
    blocks
}
