//! Core data types shared by every solver.
//!
//! - [`Alphabet`](alphabet::Alphabet): DNA, RNA or protein, chosen once per sequence
//! - [`Sequence`](sequence::Sequence): a validated, uppercase residue string
//! - [`ScoringModel`](scoring::ScoringModel): substitution table plus affine gap penalties
//! - [`Diagonal`](diagonal::Diagonal), [`DiagonalRun`](diagonal::DiagonalRun): diagonal
//!   geometry used by seeds, dotplots and alignment blocks
//! - [`AlignError`](error::AlignError): the error taxonomy of the core
//!
//! ## Alphabets
//!
//! | Alphabet | Symbols | Complement |
//! |----------|---------|------------|
//! | DNA      | A C G T | A↔T, C↔G   |
//! | RNA      | A C G U | A↔U, C↔G   |
//! | Protein  | 20 standard amino acids | none |
//!
//! Validation is case-insensitive; sequences are stored uppercase.

pub mod alphabet;
pub mod diagonal;
pub mod error;
pub mod scoring;
pub mod sequence;
pub mod types;
