//! Evidence integration and ranking engine.
//!
//! The single entry point used by reporting and visualisation collaborators.
//! A run is a pure function of its tables and policy: loader → normaliser →
//! scorer → ranker, with every intermediate owned by the call.

use metabolyx_common::{DimensionMap, EvidenceDimension, NormalisationMethod, RankingConfig};
use serde::Serialize;

use crate::error::{NormaliseError, Result};
use crate::loader;
use crate::normalise::{self, NormalisedTable};
use crate::ranker::{self, RankedResult};
use crate::scorer::{self, CandidatePolicy, ExcludedMetabolite};
use crate::table::{EvidenceTables, TableKind};
use crate::weights::WeightVector;

/// Everything that shapes a ranking besides the input tables.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingPolicy {
    pub weights: WeightVector,
    pub methods: DimensionMap<NormalisationMethod>,
    pub candidates: CandidatePolicy,
}

impl RankingPolicy {
    /// Default normalisation methods, no candidate filtering.
    pub fn new(weights: WeightVector) -> Self {
        Self {
            weights,
            methods: DimensionMap::from_fn(EvidenceDimension::default_method),
            candidates: CandidatePolicy::default(),
        }
    }

    pub fn with_method(mut self, dimension: EvidenceDimension, method: NormalisationMethod) -> Self {
        self.methods.set(dimension, method);
        self
    }

    pub fn with_candidates(mut self, candidates: CandidatePolicy) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn from_config(config: &RankingConfig) -> Result<Self> {
        let weights = WeightVector::from(&config.scoring);
        weights.validate()?;
        let candidates = if config.scoring.require_pathogen_presence {
            CandidatePolicy::require_presence_in(config.strains.pathogen.clone())
        } else {
            CandidatePolicy::default()
        };
        Ok(Self {
            weights,
            methods: DimensionMap::from_fn(|d| config.normalisation.method(d)),
            candidates,
        })
    }
}

/// Output of one ranking pass, returned by value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingOutput {
    pub ranked: RankedResult,
    pub excluded: Vec<ExcludedMetabolite>,
    pub normalised: NormalisedTable,
    /// Dimensions that were weighted but had nothing to normalise.
    pub warnings: Vec<NormaliseError>,
    /// Tables that took part, in canonical order.
    pub supplied: Vec<TableKind>,
    /// Metabolites present in every supplied table.
    pub common: usize,
}

#[derive(Debug, Clone)]
pub struct RankingEngine {
    policy: RankingPolicy,
}

impl RankingEngine {
    /// Create an engine; rejects invalid weights up front.
    pub fn new(policy: RankingPolicy) -> Result<Self> {
        policy.weights.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// Run one ranking pass.
    pub fn rank(&self, tables: &EvidenceTables) -> Result<RankingOutput> {
        let loaded = loader::load(tables)?;

        let (normalised, warnings) =
            normalise::normalise_records(&loaded.records, &self.policy.methods, &self.policy.weights);

        let (scored, excluded) = scorer::score_all(
            &loaded.records,
            &normalised,
            &self.policy.weights,
            &self.policy.candidates,
        );

        let ranked = ranker::rank_scored(scored);

        tracing::info!(
            ranked = ranked.len(),
            excluded = excluded.len(),
            warnings = warnings.len(),
            "ranking complete"
        );

        Ok(RankingOutput {
            ranked,
            excluded,
            normalised,
            warnings,
            supplied: loaded.supplied,
            common: loaded.common,
        })
    }
}

/// `rank(tables, weights)` with default normalisation and no candidate filter.
pub fn rank(tables: &EvidenceTables, weights: &WeightVector) -> Result<RankingOutput> {
    RankingEngine::new(RankingPolicy::new(*weights))?.rank(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RankError;
    use crate::scorer::ExclusionReason;
    use crate::table::{EvidenceTable, METABOLITE_ID};

    fn tables() -> EvidenceTables {
        EvidenceTables::new()
            .with(
                TableKind::Specificity,
                EvidenceTable::new(&[METABOLITE_ID, "pathogen_specificity_raw"])
                    .with_row(&["A", "5"])
                    .with_row(&["B", "3"])
                    .with_row(&["C", "5"]),
            )
            .with(
                TableKind::MlScore,
                EvidenceTable::new(&[METABOLITE_ID, "ml_score_raw"])
                    .with_row(&["A", "0.8"])
                    .with_row(&["B", "0.6"])
                    .with_row(&["C", ""]),
            )
    }

    #[test]
    fn test_rank_rejects_zero_weights() {
        let err = rank(&tables(), &WeightVector::new(0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, RankError::InvalidWeights(_)));
    }

    #[test]
    fn test_unsupplied_weighted_dimension_warns() {
        let output = rank(&tables(), &WeightVector::equal()).unwrap();
        assert_eq!(
            output.warnings,
            vec![NormaliseError::NoObservedValues {
                dimension: EvidenceDimension::TargetImpact
            }]
        );
        assert_eq!(output.ranked.len(), 3);
        assert!(!output.normalised.dimensions[EvidenceDimension::TargetImpact].is_scorable());
    }

    #[test]
    fn test_output_records_table_coverage() {
        let tables = tables().with(
            TableKind::TargetImpact,
            EvidenceTable::new(&[METABOLITE_ID, "target_impact_raw"])
                .with_row(&["A", "2"])
                .with_row(&["D", "1"]),
        );
        let output = rank(&tables, &WeightVector::equal()).unwrap();
        assert_eq!(
            output.supplied,
            vec![TableKind::Specificity, TableKind::TargetImpact, TableKind::MlScore]
        );
        // Only A appears in all three tables
        assert_eq!(output.common, 1);
        assert_eq!(output.ranked.len(), 4);
    }

    #[test]
    fn test_zero_weighted_missing_dimension_is_silent() {
        let output = rank(&tables(), &WeightVector::new(1.0, 0.0, 1.0)).unwrap();
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = RankingConfig::default();
        config.scoring.require_pathogen_presence = true;
        config.normalisation.target_impact = NormalisationMethod::Rank;
        let policy = RankingPolicy::from_config(&config).unwrap();
        assert_eq!(policy.methods[EvidenceDimension::TargetImpact], NormalisationMethod::Rank);
        assert_eq!(policy.candidates.pathogen_strains.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_candidate_policy_excludes_commensal_only() {
        let tables = tables().with(
            TableKind::Presence,
            EvidenceTable::new(&[METABOLITE_ID, "Sp_TIGR4", "Ssal_K12"])
                .with_row(&["A", "1", "0"])
                .with_row(&["B", "0", "1"])
                .with_row(&["C", "1", "1"]),
        );
        let policy = RankingPolicy::new(WeightVector::new(1.0, 0.0, 1.0))
            .with_candidates(CandidatePolicy::require_presence_in(vec!["Sp_TIGR4".to_string()]));
        let output = RankingEngine::new(policy).unwrap().rank(&tables).unwrap();

        let ranked: Vec<&str> = output.ranked.iter().map(|r| r.metabolite_id.as_str()).collect();
        // C has only specificity (1.0); A averages 1.0 and 0.8
        assert_eq!(ranked, vec!["C", "A"]);
        assert_eq!(output.excluded.len(), 1);
        assert_eq!(output.excluded[0].metabolite_id, "B");
        assert_eq!(output.excluded[0].reason, ExclusionReason::AbsentFromPathogenStrains);
    }
}
