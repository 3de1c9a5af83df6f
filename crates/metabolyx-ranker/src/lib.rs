//! metabolyx-ranker — Evidence integration and metabolite ranking engine.
//!
//! Pipeline: table loader → per-dimension normaliser → composite scorer → ranker,
//! composed by [`engine::RankingEngine`].

pub mod error;
pub mod table;
pub mod loader;
pub mod normalise;
pub mod weights;
pub mod scorer;
pub mod ranker;
pub mod engine;
pub mod provider;
pub mod derivation;

pub use engine::{rank, RankingEngine, RankingOutput, RankingPolicy};
pub use error::{NormaliseError, RankError, Result};
pub use ranker::{CompositeScoreRecord, RankedResult};
pub use scorer::{ExcludedMetabolite, ExclusionReason};
pub use table::{EvidenceTable, EvidenceTables, TableKind};
pub use weights::WeightVector;
