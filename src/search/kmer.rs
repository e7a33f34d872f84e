use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::core::error::{AlignError, Result};
use crate::core::sequence::Sequence;

/// Exact occurrence of a query k-mer in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct KmerMatch {
    /// 0-based offset of the k-mer in the query
    pub query_pos: usize,
    /// 0-based offset of the same k-mer in the database
    pub db_pos: usize,
    /// Window length `k`
    pub length: usize,
}

/// One window of the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kmer<'a> {
    pub offset: usize,
    pub residues: &'a [u8],
}

/// Every length-`k` window of a query, with a hash index from window content to the
/// offsets where it occurs.
#[derive(Debug, Clone)]
pub struct KmerIndex {
    k: usize,
    query: Vec<u8>,
    positions: HashMap<Vec<u8>, Vec<usize>>,
}

impl KmerIndex {
    /// Index all `len - k + 1` windows of `query`
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `k` is zero, or
    /// `AlignError::InvalidSequence` if the query is shorter than `k`.
    pub fn build(query: &Sequence, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(AlignError::InvalidConfiguration(
                "k-mer length must be at least 1".to_string(),
            ));
        }
        if query.len() < k {
            return Err(AlignError::InvalidSequence(format!(
                "query of length {} is shorter than the k-mer length {k}",
                query.len()
            )));
        }

        let residues = query.as_bytes();
        let mut positions: HashMap<Vec<u8>, Vec<usize>> = HashMap::new();
        for (offset, window) in residues.windows(k).enumerate() {
            positions.entry(window.to_vec()).or_default().push(offset);
        }

        debug!(
            k,
            windows = residues.len() - k + 1,
            distinct = positions.len(),
            "Built k-mer index"
        );

        Ok(Self {
            k,
            query: residues.to_vec(),
            positions,
        })
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of windows in the query
    #[must_use]
    pub fn len(&self) -> usize {
        self.query.len() - self.k + 1
    }

    /// Always false; a query shorter than `k` cannot be indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct k-mers
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.positions.len()
    }

    /// Query windows in offset order
    pub fn windows(&self) -> impl Iterator<Item = Kmer<'_>> {
        self.query
            .windows(self.k)
            .enumerate()
            .map(|(offset, residues)| Kmer { offset, residues })
    }

    /// Query offsets of `kmer`, ascending; empty if it does not occur
    #[must_use]
    pub fn offsets(&self, kmer: &[u8]) -> &[usize] {
        self.positions.get(kmer).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Every exact occurrence of an indexed query k-mer in `database`, ordered by query
/// position and then database position
///
/// # Errors
///
/// Returns `AlignError::InvalidSequence` if the database is shorter than the index's
/// `k`.
pub fn find_matches(index: &KmerIndex, database: &Sequence) -> Result<Vec<KmerMatch>> {
    let k = index.k();
    if database.len() < k {
        return Err(AlignError::InvalidSequence(format!(
            "database of length {} is shorter than the k-mer length {k}",
            database.len()
        )));
    }

    let mut matches: Vec<KmerMatch> = database
        .as_bytes()
        .windows(k)
        .enumerate()
        .flat_map(|(db_pos, window)| {
            index.offsets(window).iter().map(move |&query_pos| KmerMatch {
                query_pos,
                db_pos,
                length: k,
            })
        })
        .collect();
    matches.sort_unstable();

    debug!(matches = matches.len(), "Found exact k-mer matches");
    Ok(matches)
}
