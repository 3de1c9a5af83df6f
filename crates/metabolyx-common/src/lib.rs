//! metabolyx-common — Shared types, errors, and configuration used across all Metabolyx crates.

pub mod error;
pub mod evidence;
pub mod ranking_config;

// Re-export commonly used types
pub use evidence::{DimensionMap, EvidenceDimension, NormalisationMethod, TargetAggregation};
pub use ranking_config::{
    NormalisationConfig, OutputConfig, OutputFormat, RankingConfig, ScoringConfig,
    SignatureConfig, StrainPanel,
};
