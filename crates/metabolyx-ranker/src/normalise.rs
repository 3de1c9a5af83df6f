//! Score normalisation functions.
//!
//! Each evidence dimension is rescaled onto [0, 1] independently. Missing raw
//! values stay missing; whether they count against a metabolite is the
//! scorer's decision.

use metabolyx_common::{DimensionMap, EvidenceDimension, NormalisationMethod};
use serde::Serialize;

use crate::error::NormaliseError;
use crate::loader::MetaboliteRecord;
use crate::weights::WeightVector;

/// Parameters actually used for a dimension, enough to reproduce every
/// normalised value from its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum NormalisationParams {
    Bounded { min: f64, max: f64 },
    MinMax { observed_min: f64, observed_max: f64 },
    Rank { observed: usize },
    /// No observed values: nothing to normalise against.
    Unscorable,
}

/// One normalised cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalisedScore {
    pub raw: Option<f64>,
    /// In [0, 1]; `None` when the raw value is missing.
    pub value: Option<f64>,
    pub params: NormalisationParams,
}

/// Per-dimension summary of one normalisation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DimensionNormalisation {
    pub dimension: EvidenceDimension,
    pub method: NormalisationMethod,
    pub params: NormalisationParams,
    pub observed: usize,
}

impl DimensionNormalisation {
    pub fn is_scorable(&self) -> bool {
        !matches!(self.params, NormalisationParams::Unscorable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalisedRow {
    pub metabolite_id: String,
    pub scores: DimensionMap<NormalisedScore>,
}

impl NormalisedRow {
    pub fn values(&self) -> DimensionMap<Option<f64>> {
        self.scores.map(|_, s| s.value)
    }
}

/// The normalised score table, exposed alongside the ranking for audit.
/// Rows are sorted by metabolite identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalisedTable {
    pub dimensions: DimensionMap<DimensionNormalisation>,
    pub rows: Vec<NormalisedRow>,
}

impl NormalisedTable {
    pub fn get(&self, metabolite_id: &str) -> Option<&NormalisedRow> {
        self.rows
            .binary_search_by(|r| r.metabolite_id.as_str().cmp(metabolite_id))
            .ok()
            .map(|i| &self.rows[i])
    }
}

/// Rank-based normalisation: assign rank r in [1, N] ascending, then n = r/N.
/// Ties share the average of their ranks, so the largest value maps to 1.0
/// unless it is tied.
/// Returns normalised scores in the same order as input.
pub fn rank_normalise(raw_scores: &[f64]) -> Vec<f64> {
    let n = raw_scores.len();
    if n == 0 {
        return vec![];
    }

    let mut indexed: Vec<(usize, f64)> = raw_scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        // Find group of equal scores
        while j + 1 < n && indexed[j].1 == indexed[j + 1].1 {
            j += 1;
        }
        let avg_rank = (i + 1 + j + 1) as f64 / 2.0;
        for entry in &indexed[i..=j] {
            ranks[entry.0] = avg_rank;
        }
        i = j + 1;
    }

    ranks.iter().map(|&r| r / n as f64).collect()
}

/// Min-max normalisation within `[min_val, max_val]`.
/// A degenerate range maps to 1.0: equal values carry no discriminating
/// signal but are still evidence.
pub fn minmax_normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    if max_val <= min_val {
        return 1.0;
    }
    unit_position(value, min_val, max_val).clamp(0.0, 1.0)
}

/// Normalisation for a dimension with a known theoretical range.
/// Out-of-range values are clamped, not rejected.
pub fn bounded_normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    unit_position(value.clamp(min_val, max_val), min_val, max_val)
}

/// `(value - min) / (max - min)` on halved operands, so a range wider than
/// `f64::MAX` stays finite. Halving is exact for normal floats.
fn unit_position(value: f64, min_val: f64, max_val: f64) -> f64 {
    (value / 2.0 - min_val / 2.0) / (max_val / 2.0 - min_val / 2.0)
}

/// Normalise one column of raw values, preserving missing entries.
pub fn normalise_column(
    raw: &[Option<f64>],
    method: NormalisationMethod,
) -> (Vec<Option<f64>>, NormalisationParams) {
    let observed: Vec<f64> = raw.iter().flatten().copied().collect();
    if observed.is_empty() {
        return (vec![None; raw.len()], NormalisationParams::Unscorable);
    }

    match method {
        NormalisationMethod::Bounded { min, max } => {
            let values = raw
                .iter()
                .map(|v| v.map(|x| bounded_normalise(x, min, max)))
                .collect();
            (values, NormalisationParams::Bounded { min, max })
        }
        NormalisationMethod::MinMax => {
            let lo = observed.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let values = raw
                .iter()
                .map(|v| v.map(|x| minmax_normalise(x, lo, hi)))
                .collect();
            (values, NormalisationParams::MinMax { observed_min: lo, observed_max: hi })
        }
        NormalisationMethod::Rank => {
            let all_equal = observed.iter().all(|&x| x == observed[0]);
            let normed = if all_equal {
                vec![1.0; observed.len()]
            } else {
                rank_normalise(&observed)
            };
            let mut ranked = normed.into_iter();
            let values = raw
                .iter()
                .map(|v| v.and_then(|_| ranked.next()))
                .collect();
            (values, NormalisationParams::Rank { observed: observed.len() })
        }
    }
}

/// Normalise every dimension of the loaded records.
///
/// A dimension without a single observed value is unscorable; it is reported
/// as a warning only when its weight is positive, since only then was it
/// expected to contribute.
pub fn normalise_records(
    records: &[MetaboliteRecord],
    methods: &DimensionMap<NormalisationMethod>,
    weights: &WeightVector,
) -> (NormalisedTable, Vec<NormaliseError>) {
    let mut warnings = Vec::new();
    let mut columns: DimensionMap<(Vec<Option<f64>>, NormalisationParams)> =
        DimensionMap::from_fn(|_| (Vec::new(), NormalisationParams::Unscorable));

    for dimension in EvidenceDimension::ALL {
        let raw: Vec<Option<f64>> = records.iter().map(|r| r.raw[dimension]).collect();
        let (values, params) = normalise_column(&raw, methods[dimension]);
        if params == NormalisationParams::Unscorable && weights.weight(dimension) > 0.0 {
            tracing::warn!(dimension = dimension.label(), "dimension globally unscorable");
            warnings.push(NormaliseError::NoObservedValues { dimension });
        } else {
            tracing::debug!(dimension = dimension.label(), ?params, "dimension normalised");
        }
        columns[dimension] = (values, params);
    }

    let dimensions = DimensionMap::from_fn(|d| DimensionNormalisation {
        dimension: d,
        method: methods[d],
        params: columns[d].1,
        observed: records.iter().filter(|r| r.raw[d].is_some()).count(),
    });

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, record)| NormalisedRow {
            metabolite_id: record.id.clone(),
            scores: DimensionMap::from_fn(|d| NormalisedScore {
                raw: record.raw[d],
                value: columns[d].0[i],
                params: columns[d].1,
            }),
        })
        .collect();

    (NormalisedTable { dimensions, rows }, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_normalise_basic() {
        let normed = rank_normalise(&[10.0, 30.0, 20.0]);
        assert!((normed[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((normed[1] - 1.0).abs() < 1e-12);
        assert!((normed[2] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_normalise_ties_average() {
        let normed = rank_normalise(&[1.0, 2.0, 2.0, 3.0]);
        assert!((normed[1] - 2.5 / 4.0).abs() < 1e-12);
        assert_eq!(normed[1], normed[2]);
    }

    #[test]
    fn test_minmax_degenerate_maps_to_one() {
        assert_eq!(minmax_normalise(4.0, 4.0, 4.0), 1.0);
        let (values, params) = normalise_column(&[Some(2.0), None, Some(2.0)], NormalisationMethod::MinMax);
        assert_eq!(values, vec![Some(1.0), None, Some(1.0)]);
        assert_eq!(params, NormalisationParams::MinMax { observed_min: 2.0, observed_max: 2.0 });
    }

    #[test]
    fn test_minmax_spans_unit_interval() {
        let (values, _) = normalise_column(&[Some(3.0), Some(5.0), Some(4.0)], NormalisationMethod::MinMax);
        assert_eq!(values, vec![Some(0.0), Some(1.0), Some(0.5)]);
    }

    #[test]
    fn test_minmax_extreme_range_stays_in_unit_interval() {
        let (values, _) = normalise_column(&[Some(-1e308), Some(1e308), Some(0.0)], NormalisationMethod::MinMax);
        assert_eq!(values, vec![Some(0.0), Some(1.0), Some(0.5)]);
        let wide = bounded_normalise(f64::MAX, -f64::MAX, f64::MAX);
        assert_eq!(wide, 1.0);
    }

    #[test]
    fn test_bounded_clamps_out_of_range() {
        let method = NormalisationMethod::Bounded { min: 0.0, max: 1.0 };
        let (values, _) = normalise_column(&[Some(1.4), Some(-0.2), Some(0.35)], method);
        assert_eq!(values, vec![Some(1.0), Some(0.0), Some(0.35)]);
    }

    #[test]
    fn test_bounded_rescales_custom_range() {
        assert!((bounded_normalise(5.0, 0.0, 10.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_never_zero_filled() {
        for method in [
            NormalisationMethod::MinMax,
            NormalisationMethod::Rank,
            NormalisationMethod::Bounded { min: 0.0, max: 1.0 },
        ] {
            let (values, _) = normalise_column(&[None, Some(0.2), None, Some(0.9)], method);
            assert_eq!(values[0], None);
            assert_eq!(values[2], None);
            assert!(values[1].is_some() && values[3].is_some());
        }
    }

    #[test]
    fn test_all_missing_is_unscorable() {
        let (values, params) = normalise_column(&[None, None], NormalisationMethod::MinMax);
        assert_eq!(values, vec![None, None]);
        assert_eq!(params, NormalisationParams::Unscorable);
    }

    #[test]
    fn test_rank_all_equal_maps_to_one() {
        let (values, _) = normalise_column(&[Some(7.0), None, Some(7.0)], NormalisationMethod::Rank);
        assert_eq!(values, vec![Some(1.0), None, Some(1.0)]);
    }

    #[test]
    fn test_rank_skips_missing_positions() {
        let (values, params) = normalise_column(&[Some(1.0), None, Some(3.0)], NormalisationMethod::Rank);
        assert_eq!(values, vec![Some(0.5), None, Some(1.0)]);
        assert_eq!(params, NormalisationParams::Rank { observed: 2 });
    }
}
