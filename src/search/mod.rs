//! Heuristic seed-and-extend search.
//!
//! The search runs four stages, each a pure function of the one before:
//!
//! 1. [`kmer::KmerIndex::build`]: hash every length-`k` window of the query
//! 2. [`kmer::find_matches`]: look up every database window in the index
//! 3. [`seed::build_seeds`]: cluster matches lying on nearby diagonals
//! 4. [`extend::SeedExtender`]: grow each seed with ungapped X-drop scoring
//!
//! [`SearchPipeline`] holds the stage outputs so a caller can inspect them and
//! re-run only the stages a parameter change affects. [`search`] runs all four at
//! once.

pub mod extend;
pub mod kmer;
pub mod pipeline;
pub mod seed;

pub use extend::{extend_seeds, Extension, ExtensionParams, SeedExtender};
pub use kmer::{find_matches, Kmer, KmerIndex, KmerMatch};
pub use pipeline::{search, SearchParams, SearchPipeline, Stage};
pub use seed::{build_seeds, Seed, SeedParams};
