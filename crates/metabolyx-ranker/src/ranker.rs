//! Total ordering of scored metabolites.
//!
//! Order: composite score descending, then more present evidence dimensions,
//! then metabolite identifier ascending. Ranks are 1-based and never shared.

use metabolyx_common::{DimensionMap, EvidenceDimension};
use serde::Serialize;
use std::cmp::Ordering;

use crate::scorer::ScoredMetabolite;

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeScoreRecord {
    pub rank: usize,
    pub metabolite_id: String,
    pub name: String,
    pub composite_score: f64,
    pub present_dimensions: usize,
    pub normalised: DimensionMap<Option<f64>>,
    pub resolved_weights: DimensionMap<f64>,
}

/// Per-candidate axis values for a radar plot. Missing dimensions plot at 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarProfile {
    pub rank: usize,
    pub metabolite_id: String,
    pub axes: Vec<(EvidenceDimension, f64)>,
}

/// The ordered ranking. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedResult {
    records: Vec<CompositeScoreRecord>,
}

impl RankedResult {
    pub fn records(&self) -> &[CompositeScoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompositeScoreRecord> {
        self.records.iter()
    }

    /// The best `n` candidates (fewer if the ranking is shorter).
    pub fn top(&self, n: usize) -> &[CompositeScoreRecord] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn get(&self, metabolite_id: &str) -> Option<&CompositeScoreRecord> {
        self.records.iter().find(|r| r.metabolite_id == metabolite_id)
    }

    pub fn radar_profiles(&self, n: usize) -> Vec<RadarProfile> {
        self.top(n)
            .iter()
            .map(|r| RadarProfile {
                rank: r.rank,
                metabolite_id: r.metabolite_id.clone(),
                axes: r
                    .normalised
                    .iter()
                    .map(|(d, v)| (d, v.unwrap_or(0.0)))
                    .collect(),
            })
            .collect()
    }

    pub fn into_records(self) -> Vec<CompositeScoreRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a CompositeScoreRecord;
    type IntoIter = std::slice::Iter<'a, CompositeScoreRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Ranking comparator: `Less` means `a` ranks above `b`.
pub fn compare(a: &ScoredMetabolite, b: &ScoredMetabolite) -> Ordering {
    b.composite_score
        .total_cmp(&a.composite_score)
        .then_with(|| b.present_dimensions.cmp(&a.present_dimensions))
        .then_with(|| a.metabolite_id.cmp(&b.metabolite_id))
}

/// Sort and assign contiguous 1-based ranks.
pub fn rank_scored(mut scored: Vec<ScoredMetabolite>) -> RankedResult {
    scored.sort_by(compare);

    let records = scored
        .into_iter()
        .enumerate()
        .map(|(i, s)| CompositeScoreRecord {
            rank: i + 1,
            metabolite_id: s.metabolite_id,
            name: s.name,
            composite_score: s.composite_score,
            present_dimensions: s.present_dimensions,
            normalised: s.normalised,
            resolved_weights: s.resolved_weights,
        })
        .collect();

    RankedResult { records }
}
