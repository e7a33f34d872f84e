//! Command-line interface for seq-aligner.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **global**: End-to-end alignment with affine gaps (Gotoh)
//! - **local**: Every local alignment above a score threshold (Smith-Waterman)
//! - **search**: Seed-and-extend search of a query in a database sequence
//! - **dotplot**: Exact diagonal runs, forward and reverse complement
//!
//! Every input is either a FASTA file (first record, plain or gzipped) or, when no
//! such file exists, a literal sequence.
//!
//! ## Usage
//!
//! ```text
//! # Align two literal sequences
//! seq-aligner global ATCGATCG ATCAATCG
//!
//! # Local alignments of two FASTA files, as JSON
//! seq-aligner local a.fa b.fa --threshold 20 --format json
//!
//! # Protein alignment with BLOSUM62
//! seq-aligner global query.faa target.faa --matrix blosum62 --gap-open -11
//!
//! # Search with 3-mers
//! seq-aligner search ATCGATCGAA genome.fa.gz --kmer 3
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::core::alphabet::Alphabet;
use crate::core::scoring::{MatrixPreset, ScoringConfig, ScoringModel};
use crate::core::sequence::Sequence;
use crate::parsing::fasta::{read_first_record, NamedSequence};

pub mod dotplot;
pub mod global;
pub mod local;
pub mod search;

#[derive(Parser)]
#[command(name = "seq-aligner")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Align and search biological sequences")]
#[command(
    long_about = "seq-aligner aligns DNA, RNA and protein sequences.\n\nIt provides:\n- Global alignment with affine gaps and terminal-gap penalties\n- Multiple local alignments with containment filtering\n- BLAST-style seed-and-extend search\n- Dotplot diagonal runs on both strands"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Align two sequences end to end
    Global(global::GlobalArgs),

    /// Find local alignments between two sequences
    Local(local::LocalArgs),

    /// Search a query in a database sequence with seed-and-extend
    Search(search::SearchArgs),

    /// List exact diagonal runs between two sequences
    Dotplot(dotplot::DotplotArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Alphabet selection on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AlphabetArg {
    /// DNA if only ACGT, RNA if only ACGU, protein otherwise
    #[default]
    Auto,
    Dna,
    Rna,
    Protein,
}

impl AlphabetArg {
    #[must_use]
    pub fn resolve(self) -> Option<Alphabet> {
        match self {
            Self::Auto => None,
            Self::Dna => Some(Alphabet::Dna),
            Self::Rna => Some(Alphabet::Rna),
            Self::Protein => Some(Alphabet::Protein),
        }
    }
}

/// Substitution matrix selection on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum MatrixArg {
    Uniform,
    Blosum62,
}

impl From<MatrixArg> for MatrixPreset {
    fn from(value: MatrixArg) -> Self {
        match value {
            MatrixArg::Uniform => Self::Uniform,
            MatrixArg::Blosum62 => Self::Blosum62,
        }
    }
}

/// The two sequence inputs shared by every command
#[derive(Args)]
pub struct PairArgs {
    /// First sequence: a FASTA file (first record is used) or a literal sequence
    #[arg(required = true)]
    pub first: String,

    /// Second sequence: a FASTA file (first record is used) or a literal sequence
    #[arg(required = true)]
    pub second: String,

    /// Alphabet of both sequences
    #[arg(long, default_value = "auto")]
    pub alphabet: AlphabetArg,
}

impl PairArgs {
    /// Load both inputs, naming literal sequences `first_name` and `second_name`
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or a sequence fails validation.
    pub fn load(
        &self,
        first_name: &str,
        second_name: &str,
    ) -> anyhow::Result<(NamedSequence, NamedSequence)> {
        let alphabet = self.alphabet.resolve();
        let first = load_input(&self.first, first_name, alphabet)?;
        let second = load_input(&self.second, second_name, alphabet)?;
        Ok((first, second))
    }
}

/// Read `input` as a FASTA file if it names one, otherwise as a literal sequence
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or the sequence is invalid.
pub fn load_input(
    input: &str,
    name: &str,
    alphabet: Option<Alphabet>,
) -> anyhow::Result<NamedSequence> {
    let path = Path::new(input);
    if path.is_file() {
        return read_first_record(path, alphabet)
            .with_context(|| format!("Failed to read sequence from {}", path.display()));
    }

    let trimmed = input.trim();
    let sequence = match alphabet {
        Some(alphabet) => Sequence::new(trimmed, alphabet),
        None => Sequence::infer(trimmed),
    }
    .with_context(|| format!("'{input}' is neither a readable file nor a valid sequence"))?;

    Ok(NamedSequence {
        name: name.to_string(),
        sequence,
    })
}

/// Scoring flags shared by every command that scores residues
#[derive(Args)]
pub struct ScoringArgs {
    /// JSON scoring configuration; explicit flags below override its values
    #[arg(long)]
    pub scoring_config: Option<PathBuf>,

    /// Substitution matrix
    #[arg(long)]
    pub matrix: Option<MatrixArg>,

    /// Score of two identical residues (uniform matrix)
    #[arg(long = "match", allow_negative_numbers = true)]
    pub match_score: Option<i32>,

    /// Score of two different residues (uniform matrix)
    #[arg(long = "mismatch", allow_negative_numbers = true)]
    pub mismatch_score: Option<i32>,

    /// Score of the first column of a gap run (zero or negative)
    #[arg(long, allow_negative_numbers = true)]
    pub gap_open: Option<i32>,

    /// Score of each later column of a gap run (zero or negative)
    #[arg(long, allow_negative_numbers = true)]
    pub gap_extend: Option<i32>,

    /// Extra score of each terminal gap column in global alignments (zero or negative)
    #[arg(long, allow_negative_numbers = true)]
    pub end_gap: Option<i32>,
}

impl ScoringArgs {
    /// Merge the configuration file (if any) with explicit flags
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn to_config(&self) -> anyhow::Result<ScoringConfig> {
        let mut config = match &self.scoring_config {
            Some(path) => {
                let text = std::fs::read_to_string(path).with_context(|| {
                    format!("Failed to read scoring config {}", path.display())
                })?;
                serde_json::from_str(&text).with_context(|| {
                    format!("Failed to parse scoring config {}", path.display())
                })?
            }
            None => ScoringConfig::default(),
        };

        if let Some(matrix) = self.matrix {
            config.preset = matrix.into();
        }
        if let Some(value) = self.match_score {
            config.match_score = value;
        }
        if let Some(value) = self.mismatch_score {
            config.mismatch_score = value;
        }
        if let Some(value) = self.gap_open {
            config.gap_open = value;
        }
        if let Some(value) = self.gap_extend {
            config.gap_extend = value;
        }
        if let Some(value) = self.end_gap {
            config.end_gap = value;
        }

        Ok(config)
    }

    /// Build the scoring model
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unreadable or out of bounds.
    pub fn to_model(&self) -> anyhow::Result<ScoringModel> {
        Ok(self.to_config()?.to_model()?)
    }
}

/// Split `text` into lines of at most `width` characters
pub(crate) fn chunks(text: &str, width: usize) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(width)
            .map_or(rest.len(), |(idx, _)| idx);
        let (line, tail) = rest.split_at(cut);
        lines.push(line);
        rest = tail;
    }
    lines
}

/// Print two aligned rows with a midline, wrapped at `width` columns
pub(crate) fn print_aligned_rows(aligned1: &str, midline: &str, aligned2: &str, width: usize) {
    let rows1 = chunks(aligned1, width);
    let rows_mid = chunks(midline, width);
    let rows2 = chunks(aligned2, width);
    for (idx, row1) in rows1.iter().enumerate() {
        println!("  {row1}");
        println!("  {}", rows_mid.get(idx).copied().unwrap_or_default());
        println!("  {}", rows2.get(idx).copied().unwrap_or_default());
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks() {
        assert_eq!(chunks("ABCDEFG", 3), vec!["ABC", "DEF", "G"]);
        assert_eq!(chunks("ABC", 3), vec!["ABC"]);
        assert!(chunks("", 3).is_empty());
    }

    #[test]
    fn test_load_literal_input() {
        let named = load_input("acgt", "seq1", None).unwrap();
        assert_eq!(named.name, "seq1");
        assert_eq!(named.sequence.to_string(), "ACGT");
        assert_eq!(named.sequence.alphabet(), Alphabet::Dna);

        assert!(load_input("ACGT", "seq1", Some(Alphabet::Protein)).is_ok());
        assert!(load_input("AC GT", "seq1", Some(Alphabet::Dna)).is_err());
    }

    #[test]
    fn test_scoring_flags_override_defaults() {
        let args = ScoringArgs {
            scoring_config: None,
            matrix: None,
            match_score: Some(5),
            mismatch_score: Some(-4),
            gap_open: None,
            gap_extend: Some(-2),
            end_gap: None,
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.match_score, 5);
        assert_eq!(config.mismatch_score, -4);
        assert_eq!(config.gap_extend, -2);
        assert_eq!(config.gap_open, ScoringConfig::default().gap_open);

        let model = args.to_model().unwrap();
        assert_eq!(model.score(b'A', b'A'), 5);
    }

    #[test]
    fn test_positive_gap_flag_rejected() {
        let args = ScoringArgs {
            scoring_config: None,
            matrix: None,
            match_score: None,
            mismatch_score: None,
            gap_open: Some(3),
            gap_extend: None,
            end_gap: None,
        };
        assert!(args.to_model().is_err());
    }
}
