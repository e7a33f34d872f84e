use serde::{Deserialize, Serialize};

use crate::core::alphabet::Alphabet;
use crate::core::error::{AlignError, Result};
use crate::core::sequence::Sequence;
use crate::core::types::GAP;

/// Default reward for two identical nucleotides
pub const DEFAULT_MATCH: i32 = 2;
/// Default penalty for two different nucleotides
pub const DEFAULT_MISMATCH: i32 = -1;
/// Default penalty for the first column of a gap run
pub const DEFAULT_GAP_OPEN: i32 = -3;
/// Default penalty for each later column of a gap run
pub const DEFAULT_GAP_EXTEND: i32 = -1;
/// Default extra penalty for each gap column touching either end of a global alignment
pub const DEFAULT_END_GAP: i32 = -1;

const LETTERS: usize = 26;

/// Index of an ASCII letter in the 26x26 substitution table
#[inline]
fn letter_index(symbol: u8) -> Option<usize> {
    let upper = symbol.to_ascii_uppercase();
    upper
        .is_ascii_uppercase()
        .then(|| usize::from(upper - b'A'))
}

/// Affine gap parameters.
///
/// All three values are penalties and must be zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapPenalties {
    /// Score of the first column of a gap run
    pub open: i32,
    /// Score of each later column of a gap run
    pub extend: i32,
    /// Extra score of every gap column in a run touching either end of a global
    /// alignment
    pub end_gap: i32,
}

impl Default for GapPenalties {
    fn default() -> Self {
        Self {
            open: DEFAULT_GAP_OPEN,
            extend: DEFAULT_GAP_EXTEND,
            end_gap: DEFAULT_END_GAP,
        }
    }
}

impl GapPenalties {
    /// Reject positive penalties.
    ///
    /// `extend` is allowed to be more negative than `open`; the result is then just
    /// not biologically meaningful.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` naming the first positive value.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("gap open", self.open),
            ("gap extend", self.extend),
            ("end gap", self.end_gap),
        ] {
            if value > 0 {
                return Err(AlignError::InvalidConfiguration(format!(
                    "{name} penalty must be zero or negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// A letter-by-letter substitution table.
///
/// The table is indexed by uppercase ASCII letter and need not be symmetric:
/// `score(a, b)` and `score(b, a)` are stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MatrixTable")]
pub struct SubstitutionMatrix {
    name: String,
    scores: Vec<i32>,
}

/// Unchecked wire form of a [`SubstitutionMatrix`]
#[derive(Deserialize)]
struct MatrixTable {
    name: String,
    scores: Vec<i32>,
}

impl TryFrom<MatrixTable> for SubstitutionMatrix {
    type Error = AlignError;

    fn try_from(table: MatrixTable) -> Result<Self> {
        let matrix = Self {
            name: table.name,
            scores: table.scores,
        };
        matrix.validate()?;
        Ok(matrix)
    }
}

impl SubstitutionMatrix {
    /// Identical letters score `match_score`, every other pair `mismatch_score`
    #[must_use]
    pub fn uniform(match_score: i32, mismatch_score: i32) -> Self {
        let mut scores = vec![mismatch_score; LETTERS * LETTERS];
        for i in 0..LETTERS {
            scores[i * LETTERS + i] = match_score;
        }
        Self {
            name: format!("uniform({match_score},{mismatch_score})"),
            scores,
        }
    }

    /// BLOSUM62 over the 20 standard amino acids.
    ///
    /// Letters outside the 20 standard codes score as the worst BLOSUM62 entry.
    #[must_use]
    pub fn blosum62() -> Self {
        let worst = BLOSUM62.iter().flatten().copied().min().unwrap_or(-4);
        let mut scores = vec![worst; LETTERS * LETTERS];
        for (row, &a) in BLOSUM62_ORDER.iter().enumerate() {
            for (col, &b) in BLOSUM62_ORDER.iter().enumerate() {
                let i = usize::from(a - b'A');
                let j = usize::from(b - b'A');
                scores[i * LETTERS + j] = BLOSUM62[row][col];
            }
        }
        Self {
            name: "BLOSUM62".to_string(),
            scores,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` unless the table holds one score
    /// per ordered pair of letters.
    pub fn validate(&self) -> Result<()> {
        if self.scores.len() != LETTERS * LETTERS {
            return Err(AlignError::InvalidConfiguration(format!(
                "substitution matrix '{}' has {} scores, expected {}",
                self.name,
                self.scores.len(),
                LETTERS * LETTERS
            )));
        }
        Ok(())
    }

    /// Score of aligning `a` (first sequence) against `b` (second sequence).
    ///
    /// Non-letters score as the worst entry in the table.
    #[must_use]
    pub fn score(&self, a: u8, b: u8) -> i32 {
        match (letter_index(a), letter_index(b)) {
            (Some(i), Some(j)) => self.scores[i * LETTERS + j],
            _ => self.worst(),
        }
    }

    /// Override a single ordered pair
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if either symbol is not a letter.
    pub fn set(&mut self, a: u8, b: u8, score: i32) -> Result<()> {
        match (letter_index(a), letter_index(b)) {
            (Some(i), Some(j)) => {
                self.scores[i * LETTERS + j] = score;
                Ok(())
            }
            _ => Err(AlignError::InvalidConfiguration(format!(
                "substitution pair '{}'/'{}' must be two letters",
                char::from(a).escape_default(),
                char::from(b).escape_default()
            ))),
        }
    }

    fn worst(&self) -> i32 {
        self.scores.iter().copied().min().unwrap_or(0)
    }
}

/// Substitution scores plus affine gap penalties, shared by every solver.
///
/// Solvers take the model by reference and never mutate it, so a caller that
/// wants to adjust parameters mid-run builds a new model (or clones this one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringModel {
    matrix: SubstitutionMatrix,
    gaps: GapPenalties,
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self {
            matrix: SubstitutionMatrix::uniform(DEFAULT_MATCH, DEFAULT_MISMATCH),
            gaps: GapPenalties::default(),
        }
    }
}

impl ScoringModel {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if any gap penalty is positive.
    pub fn new(matrix: SubstitutionMatrix, gaps: GapPenalties) -> Result<Self> {
        gaps.validate()?;
        Ok(Self { matrix, gaps })
    }

    /// Uniform match/mismatch scoring
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if any gap penalty is positive.
    pub fn uniform(match_score: i32, mismatch_score: i32, gaps: GapPenalties) -> Result<Self> {
        Self::new(SubstitutionMatrix::uniform(match_score, mismatch_score), gaps)
    }

    /// BLOSUM62 protein scoring
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if any gap penalty is positive.
    pub fn blosum62(gaps: GapPenalties) -> Result<Self> {
        Self::new(SubstitutionMatrix::blosum62(), gaps)
    }

    /// Override the score of one ordered pair, e.g. to model a transition bias
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if either symbol is not a letter.
    pub fn with_pair(mut self, a: u8, b: u8, score: i32) -> Result<Self> {
        self.matrix.set(a, b, score)?;
        Ok(self)
    }

    /// Validate a raw sequence against an alphabet
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidSequence` if the text is empty or holds a symbol
    /// outside `alphabet`.
    pub fn validate(text: &str, alphabet: Alphabet) -> Result<Sequence> {
        Sequence::new(text, alphabet)
    }

    /// Substitution score. Gaps are never scored here, only through
    /// [`gap_parameters`](Self::gap_parameters).
    #[inline]
    #[must_use]
    pub fn score(&self, a: u8, b: u8) -> i32 {
        debug_assert!(
            a != GAP && b != GAP,
            "gap symbols are scored through gap penalties"
        );
        self.matrix.score(a, b)
    }

    /// Substitution score with the gap check done at runtime
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidSequence` if either argument is a gap or not a
    /// letter.
    pub fn try_score(&self, a: u8, b: u8) -> Result<i32> {
        if a == GAP || b == GAP {
            return Err(AlignError::InvalidSequence(
                "gap symbols have no substitution score".to_string(),
            ));
        }
        if letter_index(a).is_none() || letter_index(b).is_none() {
            return Err(AlignError::InvalidSequence(format!(
                "'{}'/'{}' is not a residue pair",
                char::from(a).escape_default(),
                char::from(b).escape_default()
            )));
        }
        Ok(self.matrix.score(a, b))
    }

    #[must_use]
    pub fn gap_parameters(&self) -> GapPenalties {
        self.gaps
    }

    #[must_use]
    pub fn matrix(&self) -> &SubstitutionMatrix {
        &self.matrix
    }

    /// Check a model that was deserialized or built field by field
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if any gap penalty is positive or
    /// the substitution table is not 26x26.
    pub fn validate_config(&self) -> Result<()> {
        self.matrix.validate()?;
        self.gaps.validate()
    }
}

/// Named substitution table presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixPreset {
    /// `match_score` on the diagonal, `mismatch_score` elsewhere
    #[default]
    Uniform,
    Blosum62,
}

/// A single ordered-pair override in a [`ScoringConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairOverride {
    pub a: char,
    pub b: char,
    pub score: i32,
}

/// JSON-friendly description of a [`ScoringModel`].
///
/// ```json
/// { "preset": "uniform", "match_score": 2, "mismatch_score": -1,
///   "gap_open": -3, "gap_extend": -1, "end_gap": -1,
///   "pairs": [{ "a": "A", "b": "G", "score": 1 }] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub preset: MatrixPreset,
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub end_gap: i32,
    pub pairs: Vec<PairOverride>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            preset: MatrixPreset::Uniform,
            match_score: DEFAULT_MATCH,
            mismatch_score: DEFAULT_MISMATCH,
            gap_open: DEFAULT_GAP_OPEN,
            gap_extend: DEFAULT_GAP_EXTEND,
            end_gap: DEFAULT_END_GAP,
            pairs: Vec::new(),
        }
    }
}

impl ScoringConfig {
    #[must_use]
    pub fn gaps(&self) -> GapPenalties {
        GapPenalties {
            open: self.gap_open,
            extend: self.gap_extend,
            end_gap: self.end_gap,
        }
    }

    /// Build the scoring model this configuration describes
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if a gap penalty is positive or a
    /// pair override names a non-ASCII or non-letter symbol.
    pub fn to_model(&self) -> Result<ScoringModel> {
        let mut model = match self.preset {
            MatrixPreset::Uniform => {
                ScoringModel::uniform(self.match_score, self.mismatch_score, self.gaps())?
            }
            MatrixPreset::Blosum62 => ScoringModel::blosum62(self.gaps())?,
        };

        for pair in &self.pairs {
            let (a, b) = match (u8::try_from(pair.a), u8::try_from(pair.b)) {
                (Ok(a), Ok(b)) => (a, b),
                _ => {
                    return Err(AlignError::InvalidConfiguration(format!(
                        "substitution pair '{}'/'{}' must be ASCII letters",
                        pair.a, pair.b
                    )))
                }
            };
            model = model.with_pair(a, b, pair.score)?;
        }

        Ok(model)
    }
}

/// Row/column order of [`BLOSUM62`]
const BLOSUM62_ORDER: &[u8; 20] = b"ARNDCQEGHILKMFPSTWYV";

#[rustfmt::skip]
const BLOSUM62: [[i32; 20]; 20] = [
    //A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V
    [ 4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0], // A
    [-1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3], // R
    [-2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3], // N
    [-2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3], // D
    [ 0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1], // C
    [-1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2], // Q
    [-1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2], // E
    [ 0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3], // G
    [-2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3], // H
    [-1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3], // I
    [-1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1], // L
    [-1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2], // K
    [-1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1], // M
    [-2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1], // F
    [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2], // P
    [ 1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2], // S
    [ 0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0], // T
    [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3], // W
    [-2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1], // Y
    [ 0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4], // V
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_matrix() {
        let model = ScoringModel::default();
        assert_eq!(model.score(b'A', b'A'), DEFAULT_MATCH);
        assert_eq!(model.score(b'A', b'C'), DEFAULT_MISMATCH);
        assert_eq!(model.score(b'a', b'A'), DEFAULT_MATCH);
    }

    #[test]
    fn test_blosum62_spot_checks() {
        let matrix = SubstitutionMatrix::blosum62();
        assert_eq!(matrix.score(b'A', b'A'), 4);
        assert_eq!(matrix.score(b'W', b'W'), 11);
        assert_eq!(matrix.score(b'A', b'R'), -1);
        assert_eq!(matrix.score(b'R', b'A'), -1);
        assert_eq!(matrix.score(b'W', b'C'), -2);
        // Non-standard letters fall back to the worst entry
        assert_eq!(matrix.score(b'B', b'A'), -4);
    }

    #[test]
    fn test_asymmetric_override() {
        let model = ScoringModel::default().with_pair(b'A', b'G', 1).unwrap();
        assert_eq!(model.score(b'A', b'G'), 1);
        assert_eq!(model.score(b'G', b'A'), DEFAULT_MISMATCH);
    }

    #[test]
    fn test_override_rejects_non_letters() {
        let err = ScoringModel::default().with_pair(b'-', b'A', 1).unwrap_err();
        assert!(matches!(err, AlignError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_positive_gap_penalty_rejected() {
        let gaps = GapPenalties {
            open: 2,
            ..GapPenalties::default()
        };
        let err = ScoringModel::uniform(1, -1, gaps).unwrap_err();
        assert!(matches!(err, AlignError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("gap open"));
    }

    #[test]
    fn test_try_score_rejects_gaps() {
        let model = ScoringModel::default();
        assert!(model.try_score(b'-', b'A').is_err());
        assert!(model.try_score(b'A', b'1').is_err());
        assert_eq!(model.try_score(b'A', b'A'), Ok(DEFAULT_MATCH));
    }

    #[test]
    fn test_validate() {
        assert!(ScoringModel::validate("ACGT", Alphabet::Dna).is_ok());
        assert!(ScoringModel::validate("", Alphabet::Dna).is_err());
        assert!(ScoringModel::validate("ACGU", Alphabet::Dna).is_err());
    }

    #[test]
    fn test_scoring_config_from_json() {
        let json = r#"{
            "match_score": 5,
            "mismatch_score": -4,
            "gap_open": -10,
            "pairs": [{ "a": "A", "b": "G", "score": -1 }]
        }"#;
        let config: ScoringConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.gap_extend, DEFAULT_GAP_EXTEND);

        let model = config.to_model().unwrap();
        assert_eq!(model.score(b'C', b'C'), 5);
        assert_eq!(model.score(b'C', b'T'), -4);
        assert_eq!(model.score(b'A', b'G'), -1);
        assert_eq!(model.gap_parameters().open, -10);
    }

    #[test]
    fn test_short_matrix_rejected_on_deserialize() {
        let json = r#"{
            "matrix": { "name": "custom", "scores": [] },
            "gaps": { "open": -3, "extend": -1, "end_gap": 0 }
        }"#;
        let err = serde_json::from_str::<ScoringModel>(json).unwrap_err();
        assert!(err.to_string().contains("expected 676"));
    }

    #[test]
    fn test_matrix_round_trips_through_json() {
        let model = ScoringModel::blosum62(GapPenalties::default()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let parsed: ScoringModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, model);
        assert!(parsed.validate_config().is_ok());
    }

    #[test]
    fn test_scoring_config_blosum62() {
        let config = ScoringConfig {
            preset: MatrixPreset::Blosum62,
            gap_open: -11,
            ..ScoringConfig::default()
        };
        let model = config.to_model().unwrap();
        assert_eq!(model.score(b'W', b'W'), 11);
        assert_eq!(model.matrix().name(), "BLOSUM62");
    }
}
