//! # seq-aligner
//!
//! A library for aligning and searching biological sequences.
//!
//! Three independent engines share one [`ScoringModel`]:
//!
//! - **Exact alignment**: global alignment with affine gaps and a terminal-gap
//!   penalty (Gotoh), and local alignment that extracts every well-separated
//!   alignment above a threshold (Smith-Waterman)
//! - **Heuristic search**: BLAST-style k-mer indexing, seed clustering and
//!   ungapped X-drop extension, run as a staged [`SearchPipeline`]
//! - **Dotplots**: maximal exact diagonal runs against the second sequence and its
//!   reverse complement
//!
//! ## Example
//!
//! ```rust
//! use seq_aligner::{align_global, Alphabet, GapPenalties, ScoringModel, Sequence};
//!
//! let model = ScoringModel::uniform(2, -1, GapPenalties::default()).unwrap();
//! let a = Sequence::new("ATCGATCG", Alphabet::Dna).unwrap();
//! let b = Sequence::new("ATCAATCG", Alphabet::Dna).unwrap();
//!
//! let result = align_global(&a, &b, &model).unwrap();
//! assert_eq!(result.score, 13);
//! println!("{}\n{}\n{}", result.aligned1, result.midline(), result.aligned2);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Alphabets, sequences, scoring and diagonal geometry
//! - [`alignment`]: Global and local dynamic-programming alignment
//! - [`search`]: Seed-and-extend search
//! - [`dotplot`]: Diagonal-run matching
//! - [`parsing`]: FASTA input
//! - [`cli`]: Command-line interface implementation

pub mod alignment;
pub mod cli;
pub mod core;
pub mod dotplot;
pub mod parsing;
pub mod search;
pub mod utils;

// Re-export commonly used types for convenience
pub use alignment::{
    align_global, find_local_alignments, AlignmentColumn, AlignmentResult, LocalAlignment,
    LocalConfig,
};
pub use core::alphabet::Alphabet;
pub use core::diagonal::{Diagonal, DiagonalRun};
pub use core::error::AlignError;
pub use core::scoring::{GapPenalties, ScoringConfig, ScoringModel, SubstitutionMatrix};
pub use core::sequence::Sequence;
pub use core::types::*;
pub use dotplot::{build_dotplot, DiagonalMatcher, Dotplot};
pub use search::{search, Extension, SearchParams, SearchPipeline};
