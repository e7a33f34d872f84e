use serde::{Deserialize, Serialize};

/// The gap symbol used in aligned sequences
pub const GAP: u8 = b'-';

/// Strand orientation of a diagonal run relative to the second sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Second sequence read as given
    Forward,
    /// Second sequence reversed and complemented
    ReverseComplement,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::ReverseComplement => write!(f, "-"),
        }
    }
}

/// Classification of a single alignment column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Two identical residues
    Match,
    /// Two different residues
    Mismatch,
    /// First column of a gap run
    GapOpen,
    /// Any later column of a gap run
    GapExtend,
}

impl ColumnKind {
    #[must_use]
    pub fn is_gap(self) -> bool {
        matches!(self, Self::GapOpen | Self::GapExtend)
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::Mismatch => write!(f, "mismatch"),
            Self::GapOpen => write!(f, "gap-open"),
            Self::GapExtend => write!(f, "gap-extend"),
        }
    }
}

/// Percentage of `part` in `whole`, 0.0 when `whole` is zero.
///
/// Counts are alignment lengths, far below the f64 mantissa limit.
#[inline]
#[must_use]
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        part as f64 * 100.0 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert!((percent(1, 4) - 25.0).abs() < 1e-9);
        assert!((percent(0, 0) - 0.0).abs() < 1e-9);
        assert!((percent(7, 7) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_column_kind_is_gap() {
        assert!(ColumnKind::GapOpen.is_gap());
        assert!(ColumnKind::GapExtend.is_gap());
        assert!(!ColumnKind::Match.is_gap());
        assert!(!ColumnKind::Mismatch.is_gap());
    }
}
