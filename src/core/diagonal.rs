use serde::{Deserialize, Serialize};

use crate::core::types::Orientation;

/// A diagonal of the (first sequence x second sequence) grid, identified by the
/// constant offset `pos2 - pos1` shared by every cell on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagonal(pub i64);

impl Diagonal {
    /// Diagonal through `(pos1, pos2)`
    #[must_use]
    pub fn of(pos1: usize, pos2: usize) -> Self {
        Self(to_i64(pos2) - to_i64(pos1))
    }

    /// Absolute offset between two diagonals
    #[must_use]
    pub fn distance(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl std::fmt::Display for Diagonal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

#[inline]
fn to_i64(pos: usize) -> i64 {
    // Sequence positions are bounded by allocation size, far below i64::MAX
    i64::try_from(pos).unwrap_or(i64::MAX)
}

/// A maximal run of exact residue matches along one diagonal.
///
/// This is the one diagonal-geometry record in the crate: the dotplot produces it
/// directly, and gap-free blocks of local and global alignments are reported in the
/// same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiagonalRun {
    /// 0-based start in the first sequence
    pub start1: usize,
    /// 0-based start in the second sequence (reverse-complemented coordinates for
    /// [`Orientation::ReverseComplement`] runs)
    pub start2: usize,
    /// Number of matched residues
    pub length: usize,
    pub orientation: Orientation,
}

impl DiagonalRun {
    #[must_use]
    pub fn new(start1: usize, start2: usize, length: usize, orientation: Orientation) -> Self {
        Self {
            start1,
            start2,
            length,
            orientation,
        }
    }

    #[must_use]
    pub fn diagonal(&self) -> Diagonal {
        Diagonal::of(self.start1, self.start2)
    }

    /// Exclusive end in the first sequence
    #[must_use]
    pub fn end1(&self) -> usize {
        self.start1 + self.length
    }

    /// Exclusive end in the second sequence, same coordinates as `start2`
    #[must_use]
    pub fn end2(&self) -> usize {
        self.start2 + self.length
    }

    /// Half-open range covered in the forward-strand coordinates of a second
    /// sequence of length `len2`.
    ///
    /// Forward runs map to themselves; a reverse-complement run starting at `s` in
    /// the reversed sequence covers `len2 - s - length .. len2 - s` on the forward
    /// strand.
    #[must_use]
    pub fn forward_range2(&self, len2: usize) -> std::ops::Range<usize> {
        match self.orientation {
            Orientation::Forward => self.start2..self.end2(),
            Orientation::ReverseComplement => {
                let end = len2.saturating_sub(self.start2);
                end.saturating_sub(self.length)..end
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_of() {
        assert_eq!(Diagonal::of(3, 10), Diagonal(7));
        assert_eq!(Diagonal::of(10, 3), Diagonal(-7));
        assert_eq!(Diagonal::of(5, 5), Diagonal(0));
        assert_eq!(Diagonal(3).distance(Diagonal(-2)), 5);
        assert_eq!(Diagonal(-4).to_string(), "-4");
        assert_eq!(Diagonal(4).to_string(), "+4");
    }

    #[test]
    fn test_run_geometry() {
        let run = DiagonalRun::new(2, 5, 4, Orientation::Forward);
        assert_eq!(run.end1(), 6);
        assert_eq!(run.end2(), 9);
        assert_eq!(run.diagonal(), Diagonal(3));
    }

    #[test]
    fn test_forward_range2() {
        let forward = DiagonalRun::new(0, 2, 3, Orientation::Forward);
        assert_eq!(forward.forward_range2(10), 2..5);

        // Positions 0..3 of the reverse complement are positions 7..10 of the original
        let reverse = DiagonalRun::new(0, 0, 3, Orientation::ReverseComplement);
        assert_eq!(reverse.forward_range2(10), 7..10);
    }
}
