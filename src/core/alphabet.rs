use serde::{Deserialize, Serialize};

/// The 20 standard amino acid one-letter codes
pub const PROTEIN_SYMBOLS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// DNA nucleotides
pub const DNA_SYMBOLS: &[u8; 4] = b"ACGT";

/// RNA nucleotides
pub const RNA_SYMBOLS: &[u8; 4] = b"ACGU";

/// Residue alphabet of a sequence.
///
/// Selected once when a [`Sequence`](crate::core::sequence::Sequence) is built; every
/// later membership or complement question is answered by the variant's own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alphabet {
    Dna,
    Rna,
    Protein,
}

impl Alphabet {
    /// Uppercase symbols accepted by this alphabet
    #[must_use]
    pub fn symbols(self) -> &'static [u8] {
        match self {
            Self::Dna => DNA_SYMBOLS,
            Self::Rna => RNA_SYMBOLS,
            Self::Protein => PROTEIN_SYMBOLS,
        }
    }

    /// Case-insensitive membership test
    #[must_use]
    pub fn contains(self, symbol: u8) -> bool {
        let upper = symbol.to_ascii_uppercase();
        match self {
            Self::Dna => matches!(upper, b'A' | b'C' | b'G' | b'T'),
            Self::Rna => matches!(upper, b'A' | b'C' | b'G' | b'U'),
            Self::Protein => PROTEIN_SYMBOLS.contains(&upper),
        }
    }

    /// Whether the alphabet has a complement (and so a reverse strand)
    #[must_use]
    pub fn is_nucleotide(self) -> bool {
        matches!(self, Self::Dna | Self::Rna)
    }

    /// Watson-Crick complement of an uppercase symbol, `None` for protein or unknown
    /// symbols
    #[must_use]
    pub fn complement(self, symbol: u8) -> Option<u8> {
        match (self, symbol) {
            (Self::Dna, b'A') => Some(b'T'),
            (Self::Dna, b'T') | (Self::Rna, b'U') => Some(b'A'),
            (Self::Rna, b'A') => Some(b'U'),
            (Self::Dna | Self::Rna, b'C') => Some(b'G'),
            (Self::Dna | Self::Rna, b'G') => Some(b'C'),
            _ => None,
        }
    }

    /// Guess the narrowest alphabet that accepts every symbol of `text`.
    ///
    /// DNA wins over RNA when a sequence holds only A, C and G.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        let bytes = text.as_bytes();
        if bytes.iter().all(|&b| Self::Dna.contains(b)) {
            Self::Dna
        } else if bytes.iter().all(|&b| Self::Rna.contains(b)) {
            Self::Rna
        } else {
            Self::Protein
        }
    }
}

impl std::fmt::Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dna => write!(f, "DNA"),
            Self::Rna => write!(f, "RNA"),
            Self::Protein => write!(f, "protein"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_case_insensitive() {
        assert!(Alphabet::Dna.contains(b'a'));
        assert!(Alphabet::Dna.contains(b'T'));
        assert!(!Alphabet::Dna.contains(b'U'));
        assert!(Alphabet::Rna.contains(b'u'));
        assert!(!Alphabet::Rna.contains(b'T'));
        assert!(Alphabet::Protein.contains(b'w'));
        assert!(!Alphabet::Protein.contains(b'B'));
        assert!(!Alphabet::Protein.contains(b'-'));
    }

    #[test]
    fn test_complement() {
        assert_eq!(Alphabet::Dna.complement(b'A'), Some(b'T'));
        assert_eq!(Alphabet::Dna.complement(b'G'), Some(b'C'));
        assert_eq!(Alphabet::Rna.complement(b'A'), Some(b'U'));
        assert_eq!(Alphabet::Rna.complement(b'U'), Some(b'A'));
        assert_eq!(Alphabet::Dna.complement(b'U'), None);
        assert_eq!(Alphabet::Protein.complement(b'A'), None);
    }

    #[test]
    fn test_infer() {
        assert_eq!(Alphabet::infer("ACGT"), Alphabet::Dna);
        assert_eq!(Alphabet::infer("acg"), Alphabet::Dna);
        assert_eq!(Alphabet::infer("ACGU"), Alphabet::Rna);
        assert_eq!(Alphabet::infer("MKVLW"), Alphabet::Protein);
    }
}
