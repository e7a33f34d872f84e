//! Exact dynamic-programming alignment.
//!
//! - [`global`]: Gotoh end-to-end alignment with affine gaps and a separate
//!   terminal-gap penalty
//! - [`local`]: Smith-Waterman with extraction of every non-overlapping alignment
//!   above a threshold
//!
//! Both report per-column score breakdowns ([`AlignmentColumn`]) so callers can show
//! how a total was reached.

pub mod global;
pub mod local;
pub(crate) mod matrix;
pub mod result;

pub use global::{align_global, GlobalAligner};
pub use local::{find_local_alignments, LocalAligner, LocalConfig};
pub use result::{strip_gaps, AlignmentColumn, AlignmentResult, AlignmentStats, LocalAlignment};
