use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{AlignError, Result};
use crate::core::scoring::ScoringModel;
use crate::core::sequence::Sequence;
use crate::search::extend::{extend_seeds, Extension, ExtensionParams};
use crate::search::kmer::{find_matches, KmerIndex, KmerMatch};
use crate::search::seed::{build_seeds, Seed, SeedParams};

/// Default k-mer length of the search index
pub const DEFAULT_KMER_LENGTH: usize = 4;

/// Parameters of every search stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub kmer_length: usize,
    pub seed: SeedParams,
    pub extension: ExtensionParams,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            kmer_length: DEFAULT_KMER_LENGTH,
            seed: SeedParams::default(),
            extension: ExtensionParams::default(),
        }
    }
}

impl SearchParams {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` for a zero k-mer length, zero
    /// `min_matches`, or a negative dropoff.
    pub fn validate(&self) -> Result<()> {
        if self.kmer_length == 0 {
            return Err(AlignError::InvalidConfiguration(
                "k-mer length must be at least 1".to_string(),
            ));
        }
        self.seed.validate()?;
        self.extension.validate()
    }
}

/// Stages of the seed-and-extend search, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Index,
    Match,
    Seed,
    Extend,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index => write!(f, "index"),
            Self::Match => write!(f, "match"),
            Self::Seed => write!(f, "seed"),
            Self::Extend => write!(f, "extend"),
        }
    }
}

/// Caller-held seed-and-extend search.
///
/// Each completed stage is kept as an immutable snapshot. Changing the parameters
/// of a stage discards that stage and everything after it, so the next
/// [`advance`](Self::advance) recomputes only what the change affects.
#[derive(Debug, Clone)]
pub struct SearchPipeline {
    query: Sequence,
    database: Sequence,
    model: ScoringModel,
    params: SearchParams,
    index: Option<KmerIndex>,
    matches: Option<Vec<KmerMatch>>,
    seeds: Option<Vec<Seed>>,
    extensions: Option<Vec<Extension>>,
}

impl SearchPipeline {
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `params` or the model's gap
    /// penalties are out of bounds.
    pub fn new(
        query: Sequence,
        database: Sequence,
        model: ScoringModel,
        params: SearchParams,
    ) -> Result<Self> {
        params.validate()?;
        model.validate_config()?;
        Ok(Self {
            query,
            database,
            model,
            params,
            index: None,
            matches: None,
            seeds: None,
            extensions: None,
        })
    }

    #[must_use]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    #[must_use]
    pub fn query(&self) -> &Sequence {
        &self.query
    }

    #[must_use]
    pub fn database(&self) -> &Sequence {
        &self.database
    }

    #[must_use]
    pub fn index(&self) -> Option<&KmerIndex> {
        self.index.as_ref()
    }

    #[must_use]
    pub fn matches(&self) -> Option<&[KmerMatch]> {
        self.matches.as_deref()
    }

    #[must_use]
    pub fn seeds(&self) -> Option<&[Seed]> {
        self.seeds.as_deref()
    }

    #[must_use]
    pub fn extensions(&self) -> Option<&[Extension]> {
        self.extensions.as_deref()
    }

    /// The next stage [`advance`](Self::advance) would compute, `None` when done
    #[must_use]
    pub fn next_stage(&self) -> Option<Stage> {
        if self.index.is_none() {
            Some(Stage::Index)
        } else if self.matches.is_none() {
            Some(Stage::Match)
        } else if self.seeds.is_none() {
            Some(Stage::Seed)
        } else if self.extensions.is_none() {
            Some(Stage::Extend)
        } else {
            None
        }
    }

    /// Change the k-mer length, discarding every stage
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `kmer_length` is zero.
    pub fn set_kmer_length(&mut self, kmer_length: usize) -> Result<()> {
        let params = SearchParams {
            kmer_length,
            ..self.params
        };
        params.validate()?;
        self.params = params;
        self.invalidate(Stage::Index);
        Ok(())
    }

    /// Change the seed parameters, discarding seeds and extensions
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `seed` is out of bounds.
    pub fn set_seed_params(&mut self, seed: SeedParams) -> Result<()> {
        seed.validate()?;
        self.params.seed = seed;
        self.invalidate(Stage::Seed);
        Ok(())
    }

    /// Change the extension parameters, discarding extensions
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if `extension` is out of bounds.
    pub fn set_extension_params(&mut self, extension: ExtensionParams) -> Result<()> {
        extension.validate()?;
        self.params.extension = extension;
        self.invalidate(Stage::Extend);
        Ok(())
    }

    /// Replace the scoring model. Seed and extension scores depend on it; the index
    /// and matches do not.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidConfiguration` if a gap penalty is positive.
    pub fn set_model(&mut self, model: ScoringModel) -> Result<()> {
        model.validate_config()?;
        self.model = model;
        self.invalidate(Stage::Seed);
        Ok(())
    }

    /// Drop `stage` and every later stage
    fn invalidate(&mut self, stage: Stage) {
        if stage <= Stage::Index {
            self.index = None;
        }
        if stage <= Stage::Match {
            self.matches = None;
        }
        if stage <= Stage::Seed {
            self.seeds = None;
        }
        self.extensions = None;
        debug!(stage = %stage, "Invalidated search stages");
    }

    /// Compute the next missing stage. Returns the stage computed, or `None` if the
    /// pipeline was already complete.
    ///
    /// # Errors
    ///
    /// Returns `AlignError::InvalidSequence` if the query or database is shorter
    /// than the k-mer length.
    pub fn advance(&mut self) -> Result<Option<Stage>> {
        let Some(stage) = self.next_stage() else {
            return Ok(None);
        };

        match stage {
            Stage::Index => {
                self.index = Some(KmerIndex::build(&self.query, self.params.kmer_length)?);
            }
            Stage::Match => {
                let matches = find_matches(self.require_index()?, &self.database)?;
                self.matches = Some(matches);
            }
            Stage::Seed => {
                let matches = self.matches.as_deref().unwrap_or_default();
                let query = self.query.as_bytes();
                let model = &self.model;
                // Each member contributes the self-score of its k-mer
                let self_score = |m: &KmerMatch| {
                    query[m.query_pos..m.query_pos + m.length]
                        .iter()
                        .map(|&r| model.score(r, r))
                        .sum::<i32>()
                };
                self.seeds = Some(build_seeds(matches, &self.params.seed, self_score)?);
            }
            Stage::Extend => {
                let seeds = self.seeds.as_deref().unwrap_or_default();
                self.extensions = Some(extend_seeds(
                    seeds,
                    &self.query,
                    &self.database,
                    &self.model,
                    &self.params.extension,
                )?);
            }
        }

        debug!(stage = %stage, "Completed search stage");
        Ok(Some(stage))
    }

    fn require_index(&self) -> Result<&KmerIndex> {
        self.index.as_ref().ok_or_else(|| {
            AlignError::InternalInvariantViolation(
                "match stage reached without a k-mer index".to_string(),
            )
        })
    }

    /// Advance through every remaining stage
    ///
    /// # Errors
    ///
    /// See [`advance`](Self::advance).
    pub fn run(&mut self) -> Result<&[Extension]> {
        while self.advance()?.is_some() {}
        Ok(self.extensions.as_deref().unwrap_or_default())
    }

    /// Consume the pipeline, returning its extensions (empty if not yet run)
    #[must_use]
    pub fn into_extensions(self) -> Vec<Extension> {
        self.extensions.unwrap_or_default()
    }
}

/// Run the whole seed-and-extend search in one call
///
/// # Errors
///
/// Returns `AlignError::InvalidConfiguration` for out-of-bounds parameters, or
/// `AlignError::InvalidSequence` if either sequence is shorter than the k-mer
/// length.
pub fn search(
    query: &Sequence,
    database: &Sequence,
    model: &ScoringModel,
    params: &SearchParams,
) -> Result<Vec<Extension>> {
    let mut pipeline = SearchPipeline::new(query.clone(), database.clone(), model.clone(), *params)?;
    pipeline.run()?;
    Ok(pipeline.into_extensions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::Alphabet;
    use crate::core::scoring::GapPenalties;

    fn dna(text: &str) -> Sequence {
        Sequence::new(text, Alphabet::Dna).unwrap()
    }

    fn model() -> ScoringModel {
        ScoringModel::uniform(2, -1, GapPenalties::default()).unwrap()
    }

    fn params(kmer_length: usize) -> SearchParams {
        SearchParams {
            kmer_length,
            ..SearchParams::default()
        }
    }

    #[test]
    fn test_search_finds_embedded_query() {
        let query = dna("ATCGATCGAA");
        let database = dna("GGGATCGATCGAAGGG");
        let hits = search(&query, &database, &model(), &params(3)).unwrap();

        let best = &hits[0];
        assert_eq!((best.query_start, best.query_end), (0, 10));
        assert_eq!((best.db_start, best.db_end), (3, 13));
        assert_eq!(best.query_aligned, "ATCGATCGAA");
        assert!((best.identity - 100.0).abs() < 1e-9);
        assert_eq!(best.score, best.seed_score + best.left_score + best.right_score);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_stages_advance_in_order() {
        let mut pipeline =
            SearchPipeline::new(dna("ATCGATCGAA"), dna("GGGATCGATCGAAGGG"), model(), params(3))
                .unwrap();
        assert_eq!(pipeline.next_stage(), Some(Stage::Index));
        assert_eq!(pipeline.advance().unwrap(), Some(Stage::Index));
        assert!(pipeline.index().is_some());
        assert!(pipeline.matches().is_none());
        assert_eq!(pipeline.advance().unwrap(), Some(Stage::Match));
        assert_eq!(pipeline.advance().unwrap(), Some(Stage::Seed));
        assert_eq!(pipeline.advance().unwrap(), Some(Stage::Extend));
        assert_eq!(pipeline.advance().unwrap(), None);
        assert!(!pipeline.extensions().unwrap().is_empty());
    }

    #[test]
    fn test_changing_params_invalidates_downstream_only() {
        let mut pipeline =
            SearchPipeline::new(dna("ATCGATCGAA"), dna("GGGATCGATCGAAGGG"), model(), params(3))
                .unwrap();
        pipeline.run().unwrap();

        pipeline
            .set_extension_params(ExtensionParams { dropoff: 2 })
            .unwrap();
        assert!(pipeline.seeds().is_some());
        assert!(pipeline.extensions().is_none());
        assert_eq!(pipeline.next_stage(), Some(Stage::Extend));

        pipeline
            .set_seed_params(SeedParams {
                min_matches: 3,
                diagonal_tolerance: 2,
            })
            .unwrap();
        assert!(pipeline.matches().is_some());
        assert!(pipeline.seeds().is_none());

        pipeline.set_kmer_length(4).unwrap();
        assert!(pipeline.index().is_none());
        assert_eq!(pipeline.next_stage(), Some(Stage::Index));

        pipeline.run().unwrap();
        assert_eq!(pipeline.index().unwrap().k(), 4);
    }

    #[test]
    fn test_rejected_setter_keeps_state() {
        let mut pipeline =
            SearchPipeline::new(dna("ACGTACGT"), dna("ACGTACGT"), model(), params(3)).unwrap();
        pipeline.run().unwrap();
        assert!(pipeline.set_kmer_length(0).is_err());
        assert_eq!(pipeline.next_stage(), None);
        assert_eq!(pipeline.params().kmer_length, 3);
    }

    #[test]
    fn test_short_sequences_fail_at_their_stage() {
        let mut pipeline =
            SearchPipeline::new(dna("ACGTACGT"), dna("AC"), model(), params(3)).unwrap();
        assert_eq!(pipeline.advance().unwrap(), Some(Stage::Index));
        assert!(matches!(pipeline.advance(), Err(AlignError::InvalidSequence(_))));

        let err = search(&dna("AC"), &dna("ACGTACGT"), &model(), &params(3)).unwrap_err();
        assert!(matches!(err, AlignError::InvalidSequence(_)));
    }

    #[test]
    fn test_no_shared_kmers_yields_no_hits() {
        let hits = search(&dna("AAAAAA"), &dna("CCCCCC"), &model(), &params(3)).unwrap();
        assert!(hits.is_empty());
    }
}
