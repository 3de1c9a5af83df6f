//! Composite metabolite score computation.
//!
//! composite(m) = Σ_{d∈P(m)} w_d × n(m, d) / Σ_{d∈P(m)} w_d
//!
//! where P(m) is the set of dimensions with a normalised value for m.
//! Renormalising over P(m) keeps metabolites with partial evidence
//! comparable to fully characterised ones.

use metabolyx_common::{DimensionMap, EvidenceDimension};
use serde::Serialize;
use std::fmt;

use crate::loader::MetaboliteRecord;
use crate::normalise::NormalisedTable;
use crate::weights::WeightVector;

/// Why a metabolite was left out of the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Every evidence dimension is missing.
    NoEvidence,
    /// Evidence exists only on dimensions weighted zero.
    ZeroWeightEvidenceOnly,
    /// Candidate policy: present in no pathogenic strain.
    AbsentFromPathogenStrains,
}

impl ExclusionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionReason::NoEvidence => "no_evidence",
            ExclusionReason::ZeroWeightEvidenceOnly => "zero_weight_evidence_only",
            ExclusionReason::AbsentFromPathogenStrains => "absent_from_pathogen_strains",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedMetabolite {
    pub metabolite_id: String,
    pub reason: ExclusionReason,
}

/// A metabolite with a composite score, not yet ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMetabolite {
    pub metabolite_id: String,
    pub name: String,
    pub normalised: DimensionMap<Option<f64>>,
    pub resolved_weights: DimensionMap<f64>,
    pub composite_score: f64,
    pub present_dimensions: usize,
}

/// Result of scoring one normalised vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompositeOutcome {
    Scored {
        composite: f64,
        resolved_weights: DimensionMap<f64>,
    },
    Unscorable(ExclusionReason),
}

/// Which metabolites are eligible for ranking at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePolicy {
    /// Exclude metabolites listed in the presence table but found in none
    /// of these strains. Metabolites without presence data are unaffected.
    pub pathogen_strains: Option<Vec<String>>,
}

impl CandidatePolicy {
    pub fn require_presence_in(strains: Vec<String>) -> Self {
        Self {
            pathogen_strains: Some(strains),
        }
    }

    fn check(&self, record: &MetaboliteRecord) -> Option<ExclusionReason> {
        let required = self.pathogen_strains.as_ref()?;
        let present = record.strains.as_ref()?;
        if required.iter().any(|s| present.contains(s)) {
            None
        } else {
            Some(ExclusionReason::AbsentFromPathogenStrains)
        }
    }
}

/// Compute the composite score for one normalised vector.
///
/// The sum runs in canonical dimension order so identical inputs always
/// produce bit-identical scores.
pub fn compute_composite_score(
    normalised: &DimensionMap<Option<f64>>,
    weights: &WeightVector,
) -> CompositeOutcome {
    let present = normalised.map(|_, v| v.is_some());
    if !present.iter().any(|(_, &p)| p) {
        return CompositeOutcome::Unscorable(ExclusionReason::NoEvidence);
    }

    let Some(resolved_weights) = weights.resolve(&present) else {
        return CompositeOutcome::Unscorable(ExclusionReason::ZeroWeightEvidenceOnly);
    };

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for dimension in EvidenceDimension::ALL {
        if let Some(n) = normalised[dimension] {
            let w = weights.weight(dimension);
            numerator += w * n;
            denominator += w;
        }
    }

    CompositeOutcome::Scored {
        composite: (numerator / denominator).clamp(0.0, 1.0),
        resolved_weights,
    }
}

/// Score every record, splitting scorable metabolites from excluded ones.
/// Both outputs keep the identifier order of `records`.
pub fn score_all(
    records: &[MetaboliteRecord],
    table: &NormalisedTable,
    weights: &WeightVector,
    policy: &CandidatePolicy,
) -> (Vec<ScoredMetabolite>, Vec<ExcludedMetabolite>) {
    let mut scored = Vec::with_capacity(records.len());
    let mut excluded = Vec::new();

    for (record, row) in records.iter().zip(&table.rows) {
        debug_assert_eq!(record.id, row.metabolite_id);
        let normalised = row.values();

        let outcome = match policy.check(record) {
            Some(reason) => CompositeOutcome::Unscorable(reason),
            None => compute_composite_score(&normalised, weights),
        };

        match outcome {
            CompositeOutcome::Scored {
                composite,
                resolved_weights,
            } => scored.push(ScoredMetabolite {
                metabolite_id: record.id.clone(),
                name: record.name.clone(),
                present_dimensions: normalised.iter().filter(|(_, v)| v.is_some()).count(),
                normalised,
                resolved_weights,
                composite_score: composite,
            }),
            CompositeOutcome::Unscorable(reason) => {
                tracing::debug!(metabolite = %record.id, %reason, "metabolite excluded");
                excluded.push(ExcludedMetabolite {
                    metabolite_id: record.id.clone(),
                    reason,
                });
            }
        }
    }

    if !excluded.is_empty() {
        tracing::warn!(excluded = excluded.len(), "metabolites excluded from ranking");
    }

    (scored, excluded)
}
