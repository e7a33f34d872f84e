//! Input parsers.
//!
//! - **FASTA files** (plain, gzip or bgzip): [`fasta::read_fasta_file`] and
//!   [`fasta::read_first_record`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use seq_aligner::parsing::fasta::read_first_record;
//! use std::path::Path;
//!
//! let record = read_first_record(Path::new("query.fa"), None).unwrap();
//! println!("{}: {} residues", record.name, record.sequence.len());
//! ```

use crate::core::error::AlignError;

pub mod fasta;

/// Errors raised while reading sequence files
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Too many records: {0} exceeds maximum allowed")]
    TooManyRecords(usize),

    #[error("Record '{name}': {source}")]
    InvalidSequence {
        name: String,
        #[source]
        source: AlignError,
    },
}
