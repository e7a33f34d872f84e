//! Reader for FASTA files using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed files. Records are validated
//! into [`Sequence`]s as they are read; the alphabet is either given by the caller
//! or inferred per record.

use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;
use tracing::debug;

use crate::core::alphabet::Alphabet;
use crate::core::sequence::Sequence;
use crate::parsing::ParseError;
use crate::utils::validation::check_record_limit;

/// A FASTA record with a validated sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSequence {
    /// Record name, the first word of the header line
    pub name: String,
    pub sequence: Sequence,
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read every record of a FASTA file.
///
/// With `alphabet` set, every record is validated against it; otherwise each
/// record's alphabet is inferred from its residues.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::InvalidFormat` if no records are found,
/// `ParseError::TooManyRecords` if the limit is exceeded, or
/// `ParseError::InvalidSequence` if a record fails validation.
pub fn read_fasta_file(
    path: &Path,
    alphabet: Option<Alphabet>,
) -> Result<Vec<NamedSequence>, ParseError> {
    let file = std::fs::File::open(path)?;
    let records = if is_gzipped(path) {
        let mut reader = fasta::io::Reader::new(BufReader::new(GzDecoder::new(file)));
        read_records(&mut reader, alphabet, usize::MAX)?
    } else {
        let mut reader = fasta::io::Reader::new(BufReader::new(file));
        read_records(&mut reader, alphabet, usize::MAX)?
    };

    debug!(path = %path.display(), records = records.len(), "Read FASTA file");
    Ok(records)
}

/// Read only the first record of a FASTA file
///
/// # Errors
///
/// See [`read_fasta_file`].
pub fn read_first_record(
    path: &Path,
    alphabet: Option<Alphabet>,
) -> Result<NamedSequence, ParseError> {
    let file = std::fs::File::open(path)?;
    let mut records = if is_gzipped(path) {
        let mut reader = fasta::io::Reader::new(BufReader::new(GzDecoder::new(file)));
        read_records(&mut reader, alphabet, 1)?
    } else {
        let mut reader = fasta::io::Reader::new(BufReader::new(file));
        read_records(&mut reader, alphabet, 1)?
    };

    // read_records never returns an empty list
    records
        .pop()
        .ok_or_else(|| ParseError::InvalidFormat("No sequences found in FASTA file".to_string()))
}

/// Read up to `take` records from a noodles FASTA reader
///
/// # Errors
///
/// See [`read_fasta_file`].
pub fn read_records<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
    alphabet: Option<Alphabet>,
    take: usize,
) -> Result<Vec<NamedSequence>, ParseError> {
    let mut records = Vec::new();

    for result in reader.records().take(take) {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        if check_record_limit(records.len()).is_some() {
            return Err(ParseError::TooManyRecords(records.len()));
        }

        let name = String::from_utf8_lossy(record.name()).to_string();
        let residues = record.sequence().as_ref();
        let alphabet = alphabet.unwrap_or_else(|| {
            Alphabet::infer(&String::from_utf8_lossy(residues))
        });
        let sequence = Sequence::new(residues, alphabet).map_err(|source| {
            ParseError::InvalidSequence {
                name: name.clone(),
                source,
            }
        })?;

        records.push(NamedSequence { name, sequence });
    }

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(records)
}
