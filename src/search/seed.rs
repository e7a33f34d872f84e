use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::diagonal::Diagonal;
use crate::core::error::{AlignError, Result};
use crate::search::kmer::KmerMatch;

/// Default minimum number of k-mer matches in a reported seed
pub const DEFAULT_MIN_MATCHES: usize = 2;

/// Default slack, in residues, allowed between consecutive matches of a seed
pub const DEFAULT_DIAGONAL_TOLERANCE: usize = 3;

/// Seed clustering parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedParams {
    /// Minimum number of member matches (at least 1)
    pub min_matches: usize,
    /// Largest gap between consecutive matches, and largest diagonal drift, that
    /// still joins a match to a seed
    pub diagonal_tolerance: usize,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            min_matches: DEFAULT_MIN_MATCHES,
            diagonal_tolerance: DEFAULT_DIAGONAL_TOLERANCE,
        }
    }
}

impl SeedParams {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `min_matches` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.min_matches == 0 {
            return Err(AlignError::InvalidConfiguration(
                "seeds need at least 1 member match".to_string(),
            ));
        }
        Ok(())
    }
}

/// A cluster of k-mer matches lying on (nearly) the same diagonal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Seed {
    pub query_start: usize,
    /// Exclusive
    pub query_end: usize,
    pub db_start: usize,
    /// Exclusive
    pub db_end: usize,
    /// Diagonal of the first member match
    pub diagonal: Diagonal,
    /// Number of member matches
    pub matches: usize,
    pub score: i32,
}

/// The seed still accepting matches, plus the last match it took
struct OpenSeed {
    seed: Seed,
    last_query: usize,
    last_db: usize,
}

impl OpenSeed {
    fn new(m: &KmerMatch, score: i32) -> Self {
        Self {
            seed: Seed {
                query_start: m.query_pos,
                query_end: m.query_pos + m.length,
                db_start: m.db_pos,
                db_end: m.db_pos + m.length,
                diagonal: Diagonal::of(m.query_pos, m.db_pos),
                matches: 1,
                score,
            },
            last_query: m.query_pos,
            last_db: m.db_pos,
        }
    }

    /// Whether `m` advances in both sequences and lies within `tolerance` of the
    /// seed's end, on a diagonal at most `tolerance` away from it
    fn accepts(&self, m: &KmerMatch, tolerance: usize) -> bool {
        if m.query_pos <= self.last_query || m.db_pos <= self.last_db {
            return false;
        }
        // Overlapping windows on the same diagonal give negative gaps
        let query_gap = to_i64(m.query_pos) - to_i64(self.seed.query_end);
        let db_gap = to_i64(m.db_pos) - to_i64(self.seed.db_end);
        let drift = Diagonal::of(m.query_pos, m.db_pos)
            .distance(Diagonal::of(self.seed.query_end, self.seed.db_end));
        let limit = to_i64(tolerance);
        query_gap <= limit && db_gap <= limit && drift <= u64::try_from(tolerance).unwrap_or(u64::MAX)
    }

    fn absorb(&mut self, m: &KmerMatch, score: i32) {
        self.seed.query_end = self.seed.query_end.max(m.query_pos + m.length);
        self.seed.db_end = self.seed.db_end.max(m.db_pos + m.length);
        self.seed.matches += 1;
        self.seed.score = self.seed.score.saturating_add(score);
        self.last_query = m.query_pos;
        self.last_db = m.db_pos;
    }
}

#[inline]
fn to_i64(pos: usize) -> i64 {
    i64::try_from(pos).unwrap_or(i64::MAX)
}

/// Group k-mer matches into seeds.
///
/// Matches are walked in database order with one seed open at a time. A match
/// joins the open seed if it advances in both sequences and its query and
/// database gaps from the seed's end are both within `diagonal_tolerance`, as is
/// their difference. Any other match closes the open seed and starts a new one.
/// `match_score` gives each member's contribution, typically the self-score of
/// the k-mer.
///
/// Returns seeds with at least `min_matches` members, best score first (ties by
/// database start, then query start).
///
/// # Errors
///
/// Returns `AlignError::InvalidConfiguration` if `params` is out of bounds.
pub fn build_seeds<F>(matches: &[KmerMatch], params: &SeedParams, match_score: F) -> Result<Vec<Seed>>
where
    F: Fn(&KmerMatch) -> i32,
{
    params.validate()?;
    let tolerance = params.diagonal_tolerance;

    let mut ordered = matches.to_vec();
    ordered.sort_unstable_by_key(|m| (m.db_pos, m.query_pos));

    let mut current: Option<OpenSeed> = None;
    let mut closed: Vec<Seed> = Vec::new();

    for m in &ordered {
        let score = match_score(m);
        match current.as_mut().filter(|open| open.accepts(m, tolerance)) {
            Some(open) => open.absorb(m, score),
            None => closed.extend(current.replace(OpenSeed::new(m, score)).map(|open| open.seed)),
        }
    }
    closed.extend(current.map(|open| open.seed));

    let total = closed.len();
    let mut seeds: Vec<Seed> = closed
        .into_iter()
        .filter(|seed| seed.matches >= params.min_matches)
        .collect();
    seeds.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.db_start.cmp(&b.db_start))
            .then(a.query_start.cmp(&b.query_start))
    });

    debug!(
        clusters = total,
        seeds = seeds.len(),
        min_matches = params.min_matches,
        "Built seeds"
    );
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(query_pos: usize, db_pos: usize) -> KmerMatch {
        KmerMatch {
            query_pos,
            db_pos,
            length: 3,
        }
    }

    /// Every member scores `k * match_score`
    fn per_match(match_score: i32) -> impl Fn(&KmerMatch) -> i32 {
        move |m: &KmerMatch| i32::try_from(m.length).unwrap() * match_score
    }

    fn params(min_matches: usize, diagonal_tolerance: usize) -> SeedParams {
        SeedParams {
            min_matches,
            diagonal_tolerance,
        }
    }

    #[test]
    fn test_consecutive_matches_form_one_seed() {
        let matches = vec![hit(0, 10), hit(1, 11), hit(2, 12), hit(3, 13)];
        let seeds = build_seeds(&matches, &params(2, 3), per_match(2)).unwrap();
        assert_eq!(seeds.len(), 1);
        let seed = seeds[0];
        assert_eq!((seed.query_start, seed.query_end), (0, 6));
        assert_eq!((seed.db_start, seed.db_end), (10, 16));
        assert_eq!(seed.matches, 4);
        assert_eq!(seed.score, 4 * 3 * 2);
        assert_eq!(seed.diagonal, Diagonal(10));
    }

    #[test]
    fn test_min_matches_filters_singletons() {
        let matches = vec![hit(0, 10), hit(1, 11), hit(20, 2)];
        let seeds = build_seeds(&matches, &params(2, 3), per_match(2)).unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].matches, 2);

        let seeds = build_seeds(&matches, &params(1, 3), per_match(2)).unwrap();
        assert_eq!(seeds.len(), 2);
    }

    #[test]
    fn test_small_gap_within_tolerance_joins() {
        // Second match starts 2 past the first one's end on a diagonal shifted by 1
        let matches = vec![hit(0, 0), hit(5, 6)];
        let seeds = build_seeds(&matches, &params(2, 3), per_match(1)).unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!((seeds[0].query_end, seeds[0].db_end), (8, 9));
        assert_eq!(seeds[0].diagonal, Diagonal(0));
    }

    #[test]
    fn test_gap_beyond_tolerance_splits() {
        let matches = vec![hit(0, 0), hit(1, 1), hit(10, 10), hit(11, 11)];
        let seeds = build_seeds(&matches, &params(2, 3), per_match(1)).unwrap();
        assert_eq!(seeds.len(), 2);
        // Equal scores fall back to database order
        assert_eq!(seeds[0].db_start, 0);
        assert_eq!(seeds[1].db_start, 10);
    }

    #[test]
    fn test_match_on_another_diagonal_closes_the_open_seed() {
        // Repeats on diagonals 0 and -5 interleave in database order, so each
        // switch closes the seed in progress
        let matches = vec![
            hit(0, 0),
            hit(5, 0),
            hit(1, 1),
            hit(6, 1),
            hit(2, 2),
            hit(3, 3),
        ];
        let seeds = build_seeds(&matches, &params(1, 3), per_match(1)).unwrap();
        assert_eq!(seeds.len(), 5);
        assert_eq!(seeds[0].matches, 2);
        assert_eq!((seeds[0].query_start, seeds[0].db_start), (2, 2));
        assert!(seeds[1..].iter().all(|s| s.matches == 1));

        let kept = build_seeds(&matches, &params(2, 3), per_match(1)).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].diagonal, Diagonal(0));
    }

    #[test]
    fn test_distant_match_later_in_database_order_splits_once() {
        // (0, 20) sorts after the diagonal-0 run, so it only closes it at the end
        let matches = vec![hit(0, 0), hit(1, 1), hit(0, 20), hit(2, 2), hit(3, 3)];
        let seeds = build_seeds(&matches, &params(1, 3), per_match(1)).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!((seeds[0].diagonal, seeds[0].matches), (Diagonal(0), 4));
        assert_eq!((seeds[0].query_start, seeds[0].query_end), (0, 6));
        assert_eq!((seeds[1].diagonal, seeds[1].matches), (Diagonal(20), 1));
    }

    #[test]
    fn test_match_must_advance_in_both_sequences() {
        // Same db position twice cannot extend the same seed
        let matches = vec![hit(0, 0), hit(4, 0)];
        let seeds = build_seeds(&matches, &params(1, 3), per_match(1)).unwrap();
        assert_eq!(seeds.len(), 2);
    }

    #[test]
    fn test_zero_min_matches_rejected() {
        let err = build_seeds(&[], &params(0, 3), per_match(1)).unwrap_err();
        assert!(matches!(err, AlignError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_input() {
        let seeds = build_seeds(&[], &SeedParams::default(), per_match(2)).unwrap();
        assert!(seeds.is_empty());
    }
}
