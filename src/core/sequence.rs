use serde::{Serialize, Serializer};

use crate::core::alphabet::Alphabet;
use crate::core::error::{AlignError, Result};

/// A validated, uppercase residue sequence.
///
/// The only way to build one is through [`Sequence::new`], so every instance is
/// non-empty and contains only symbols of its alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    residues: Vec<u8>,
    alphabet: Alphabet,
}

impl Sequence {
    /// Validate `text` against `alphabet` and store it uppercased.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidSequence` if `text` is empty or contains a symbol
    /// outside the alphabet.
    pub fn new(text: impl AsRef<[u8]>, alphabet: Alphabet) -> Result<Self> {
        let text = text.as_ref();
        if text.is_empty() {
            return Err(AlignError::InvalidSequence(
                "sequence is empty".to_string(),
            ));
        }

        if let Some((pos, &symbol)) = text
            .iter()
            .enumerate()
            .find(|&(_, &b)| !alphabet.contains(b))
        {
            return Err(AlignError::InvalidSequence(format!(
                "symbol '{}' at position {pos} is not a valid {alphabet} residue",
                char::from(symbol).escape_default()
            )));
        }

        Ok(Self {
            residues: text.to_ascii_uppercase(),
            alphabet,
        })
    }

    /// Build a sequence, inferring the alphabet from its symbols
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidSequence` if `text` is empty or is not a valid
    /// protein sequence either.
    pub fn infer(text: &str) -> Result<Self> {
        Self::new(text, Alphabet::infer(text))
    }

    #[must_use]
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.residues
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Reverse complement of a nucleotide sequence
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidSequence` for protein sequences, which have no
    /// complement.
    pub fn reverse_complement(&self) -> Result<Self> {
        let residues = self
            .residues
            .iter()
            .rev()
            .map(|&b| self.alphabet.complement(b))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| {
                AlignError::InvalidSequence(format!(
                    "{} sequences have no reverse complement",
                    self.alphabet
                ))
            })?;

        Ok(Self {
            residues,
            alphabet: self.alphabet,
        })
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Residues are validated ASCII letters
        write!(f, "{}", String::from_utf8_lossy(&self.residues))
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uppercases() {
        let seq = Sequence::new("acgT", Alphabet::Dna).unwrap();
        assert_eq!(seq.as_bytes(), b"ACGT");
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.to_string(), "ACGT");
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = Sequence::new("", Alphabet::Dna).unwrap_err();
        assert!(matches!(err, AlignError::InvalidSequence(_)));
    }

    #[test]
    fn test_new_rejects_foreign_symbols() {
        assert!(Sequence::new("ACGN", Alphabet::Dna).is_err());
        assert!(Sequence::new("ACGT", Alphabet::Rna).is_err());
        assert!(Sequence::new("AC-GT", Alphabet::Dna).is_err());
        assert!(Sequence::new("MKXV", Alphabet::Protein).is_err());

        let err = Sequence::new("ACGN", Alphabet::Dna).unwrap_err();
        assert!(err.to_string().contains("position 3"));
    }

    #[test]
    fn test_reverse_complement() {
        let seq = Sequence::new("AACGTT", Alphabet::Dna).unwrap();
        assert_eq!(seq.reverse_complement().unwrap().as_bytes(), b"AACGTT");

        let seq = Sequence::new("ATGC", Alphabet::Dna).unwrap();
        assert_eq!(seq.reverse_complement().unwrap().as_bytes(), b"GCAT");

        let rna = Sequence::new("AUGC", Alphabet::Rna).unwrap();
        assert_eq!(rna.reverse_complement().unwrap().as_bytes(), b"GCAU");
    }

    #[test]
    fn test_reverse_complement_protein_fails() {
        let seq = Sequence::new("MKV", Alphabet::Protein).unwrap();
        assert!(matches!(
            seq.reverse_complement(),
            Err(AlignError::InvalidSequence(_))
        ));
    }

    #[test]
    fn test_infer() {
        assert_eq!(Sequence::infer("acgt").unwrap().alphabet(), Alphabet::Dna);
        assert_eq!(Sequence::infer("MKWV").unwrap().alphabet(), Alphabet::Protein);
        assert!(Sequence::infer("AC1").is_err());
    }
}
