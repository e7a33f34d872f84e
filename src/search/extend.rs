use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{AlignError, Result};
use crate::core::scoring::ScoringModel;
use crate::core::sequence::Sequence;
use crate::core::types::percent;
use crate::search::seed::Seed;

/// Default X-drop: how far the running score may fall below its best before an
/// extension stops
pub const DEFAULT_DROPOFF: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionParams {
    /// Non-negative X-drop threshold
    pub dropoff: i32,
}

impl Default for ExtensionParams {
    fn default() -> Self {
        Self {
            dropoff: DEFAULT_DROPOFF,
        }
    }
}

impl ExtensionParams {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `dropoff` is negative.
    pub fn validate(&self) -> Result<()> {
        if self.dropoff < 0 {
            return Err(AlignError::InvalidConfiguration(format!(
                "extension dropoff must be zero or positive, got {}",
                self.dropoff
            )));
        }
        Ok(())
    }
}

/// An ungapped high-scoring segment grown from a seed.
///
/// The extension itself never opens a gap, but a seed may span a small indel, so
/// the query and database spans can differ in length. `query_aligned` and
/// `db_aligned` are then the raw spans, not gapped alignment rows, and `identity`
/// pairs the two spans from their starts and divides by the longer one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extension {
    pub query_start: usize,
    /// Exclusive
    pub query_end: usize,
    pub db_start: usize,
    /// Exclusive
    pub db_end: usize,
    /// Query residues covered by the extension
    pub query_aligned: String,
    /// Database residues covered by the extension
    pub db_aligned: String,
    pub seed_score: i32,
    /// Best score reached extending towards the sequence starts
    pub left_score: i32,
    /// Best score reached extending towards the sequence ends
    pub right_score: i32,
    /// `seed_score + left_score + right_score`
    pub score: i32,
    /// Percentage of identical residues, pairing both spans from their starts
    pub identity: f64,
}

impl Extension {
    /// Coordinates in both sequences, the identity key for deduplication
    #[must_use]
    pub fn coordinates(&self) -> (usize, usize, usize, usize) {
        (self.query_start, self.query_end, self.db_start, self.db_end)
    }
}

/// Walk residue pairs outward from a seed boundary, keeping the best running score.
///
/// Returns the best score (never below zero) and the number of pairs consumed to
/// reach it.
fn xdrop<'a, I>(model: &ScoringModel, pairs: I, dropoff: i32) -> (i32, usize)
where
    I: Iterator<Item = (&'a u8, &'a u8)>,
{
    let (mut score, mut best, mut best_len) = (0i32, 0i32, 0usize);
    for (step, (&a, &b)) in pairs.enumerate() {
        score += model.score(a, b);
        if score > best {
            best = score;
            best_len = step + 1;
        } else if best - score > dropoff {
            break;
        }
    }
    (best, best_len)
}

/// Extends seeds in both directions with ungapped X-drop scoring
pub struct SeedExtender<'a> {
    model: &'a ScoringModel,
    params: ExtensionParams,
}

impl<'a> SeedExtender<'a> {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `params` is out of bounds or the
    /// model's substitution table is malformed.
    pub fn new(model: &'a ScoringModel, params: ExtensionParams) -> Result<Self> {
        params.validate()?;
        model.matrix().validate()?;
        Ok(Self { model, params })
    }

    /// Extend one seed
    #[must_use]
    pub fn extend(&self, seed: &Seed, query: &[u8], database: &[u8]) -> Extension {
        let dropoff = self.params.dropoff;

        let left_pairs = query[..seed.query_start]
            .iter()
            .rev()
            .zip(database[..seed.db_start].iter().rev());
        let (left_score, left_len) = xdrop(self.model, left_pairs, dropoff);

        let right_pairs = query[seed.query_end..]
            .iter()
            .zip(database[seed.db_end..].iter());
        let (right_score, right_len) = xdrop(self.model, right_pairs, dropoff);

        let query_start = seed.query_start - left_len;
        let query_end = seed.query_end + right_len;
        let db_start = seed.db_start - left_len;
        let db_end = seed.db_end + right_len;

        let query_span = &query[query_start..query_end];
        let db_span = &database[db_start..db_end];
        let identical = query_span
            .iter()
            .zip(db_span)
            .filter(|(a, b)| a == b)
            .count();

        Extension {
            query_start,
            query_end,
            db_start,
            db_end,
            query_aligned: String::from_utf8_lossy(query_span).into_owned(),
            db_aligned: String::from_utf8_lossy(db_span).into_owned(),
            seed_score: seed.score,
            left_score,
            right_score,
            score: seed.score.saturating_add(left_score).saturating_add(right_score),
            identity: percent(identical, query_span.len().max(db_span.len())),
        }
    }

    /// Extend every seed in parallel.
    ///
    /// Seeds converging on identical coordinates are reported once with the higher
    /// score. Output is best score first.
    #[must_use]
    pub fn extend_all(&self, seeds: &[Seed], query: &Sequence, database: &Sequence) -> Vec<Extension> {
        let (q, d) = (query.as_bytes(), database.as_bytes());

        let mut extensions: Vec<Extension> = seeds
            .par_iter()
            .map(|seed| self.extend(seed, q, d))
            .collect();

        extensions.sort_by(|a, b| {
            a.coordinates()
                .cmp(&b.coordinates())
                .then(b.score.cmp(&a.score))
        });
        let before = extensions.len();
        extensions.dedup_by(|later, earlier| later.coordinates() == earlier.coordinates());

        extensions.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.query_start.cmp(&b.query_start))
                .then(a.db_start.cmp(&b.db_start))
        });

        debug!(
            seeds = seeds.len(),
            extensions = extensions.len(),
            duplicates = before - extensions.len(),
            dropoff = self.params.dropoff,
            "Extended seeds"
        );
        extensions
    }
}

/// Extend `seeds` over `query` and `database`
///
/// # Errors
///
/// See [`SeedExtender::new`].
pub fn extend_seeds(
    seeds: &[Seed],
    query: &Sequence,
    database: &Sequence,
    model: &ScoringModel,
    params: &ExtensionParams,
) -> Result<Vec<Extension>> {
    Ok(SeedExtender::new(model, *params)?.extend_all(seeds, query, database))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::Alphabet;
    use crate::core::diagonal::Diagonal;
    use crate::core::scoring::GapPenalties;

    fn dna(text: &str) -> Sequence {
        Sequence::new(text, Alphabet::Dna).unwrap()
    }

    fn model() -> ScoringModel {
        ScoringModel::uniform(2, -1, GapPenalties::default()).unwrap()
    }

    fn seed(query_start: usize, db_start: usize, length: usize, score: i32) -> Seed {
        Seed {
            query_start,
            query_end: query_start + length,
            db_start,
            db_end: db_start + length,
            diagonal: Diagonal::of(query_start, db_start),
            matches: 1,
            score,
        }
    }

    #[test]
    fn test_extends_through_matching_flanks() {
        let query = dna("ACGTACGT");
        let database = dna("TTACGTACGTTT");
        // Seed covers query 2..5 / db 4..7
        let extensions = extend_seeds(
            &[seed(2, 4, 3, 6)],
            &query,
            &database,
            &model(),
            &ExtensionParams { dropoff: 5 },
        )
        .unwrap();

        let ext = &extensions[0];
        assert_eq!((ext.query_start, ext.query_end), (0, 8));
        assert_eq!((ext.db_start, ext.db_end), (2, 10));
        assert_eq!(ext.left_score, 4);
        assert_eq!(ext.right_score, 6);
        assert_eq!(ext.score, 16);
        assert_eq!(ext.query_aligned, "ACGTACGT");
        assert!((ext.identity - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_viable_extension_keeps_seed_score() {
        // Flanks mismatch everywhere
        let query = dna("AAACGTAAA");
        let database = dna("CCCCGTCCC");
        let extensions = extend_seeds(
            &[seed(3, 3, 3, 6)],
            &query,
            &database,
            &model(),
            &ExtensionParams::default(),
        )
        .unwrap();
        let ext = &extensions[0];
        assert_eq!(ext.score, ext.seed_score);
        assert_eq!((ext.left_score, ext.right_score), (0, 0));
        assert_eq!((ext.query_start, ext.query_end), (3, 6));
    }

    #[test]
    fn test_dropoff_stops_extension() {
        // One mismatch then matches: recoverable with a large dropoff, not with zero
        let query = dna("ACGTTACGG");
        let database = dna("ACGTAACGG");
        let wide = extend_seeds(
            &[seed(0, 0, 4, 8)],
            &query,
            &database,
            &model(),
            &ExtensionParams { dropoff: 5 },
        )
        .unwrap();
        assert_eq!(wide[0].query_end, 9);
        assert_eq!(wide[0].right_score, -1 + 4 * 2);

        let narrow = extend_seeds(
            &[seed(0, 0, 4, 8)],
            &query,
            &database,
            &model(),
            &ExtensionParams { dropoff: 0 },
        )
        .unwrap();
        assert_eq!(narrow[0].query_end, 4);
        assert_eq!(narrow[0].right_score, 0);
    }

    #[test]
    fn test_duplicate_extensions_collapse() {
        let query = dna("ACGTACGT");
        let database = dna("ACGTACGT");
        let extensions = extend_seeds(
            &[seed(0, 0, 3, 6), seed(4, 4, 3, 9)],
            &query,
            &database,
            &model(),
            &ExtensionParams::default(),
        )
        .unwrap();
        assert_eq!(extensions.len(), 1);
        assert_eq!(extensions[0].seed_score, 9);
    }

    #[test]
    fn test_seed_across_indel_has_unequal_spans() {
        // The query carries one extra T; the seed spans it in both sequences
        let query = dna("ACGTTACGT");
        let database = dna("ACGTACGT");
        let indel_seed = Seed {
            query_start: 0,
            query_end: 9,
            db_start: 0,
            db_end: 8,
            diagonal: Diagonal(0),
            matches: 2,
            score: 16,
        };
        let extensions = extend_seeds(
            &[indel_seed],
            &query,
            &database,
            &model(),
            &ExtensionParams::default(),
        )
        .unwrap();

        let ext = &extensions[0];
        assert_eq!(ext.query_aligned, "ACGTTACGT");
        assert_eq!(ext.db_aligned, "ACGTACGT");
        // ACGT pairs up, the rest is shifted by one: 4 of 9
        assert!((ext.identity - 400.0 / 9.0).abs() < 1e-9);
        assert_eq!(ext.score, 16);
    }

    #[test]
    fn test_negative_dropoff_rejected() {
        let model = model();
        assert!(matches!(
            SeedExtender::new(&model, ExtensionParams { dropoff: -1 }),
            Err(AlignError::InvalidConfiguration(_))
        ));
    }
}
