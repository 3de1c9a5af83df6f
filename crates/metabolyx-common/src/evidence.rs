//! Evidence dimensions and the per-dimension vocabulary shared by the
//! ranker, the configuration layer and the command-line front-end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One independent line of computational evidence for a metabolite.
///
/// The declaration order is the canonical iteration order everywhere in the
/// workspace (weighted sums, output columns), so it must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceDimension {
    /// Presence across pathogenic strains, absence from commensals.
    PathogenSpecificity,
    /// Predicted interactions with significant host genes.
    TargetImpact,
    /// Learned immunomodulatory bioactivity probability.
    MlScore,
}

impl EvidenceDimension {
    pub const ALL: [EvidenceDimension; 3] = [
        EvidenceDimension::PathogenSpecificity,
        EvidenceDimension::TargetImpact,
        EvidenceDimension::MlScore,
    ];

    pub fn index(self) -> usize {
        match self {
            EvidenceDimension::PathogenSpecificity => 0,
            EvidenceDimension::TargetImpact => 1,
            EvidenceDimension::MlScore => 2,
        }
    }

    /// Short snake_case label used in output tables and config keys.
    pub fn label(self) -> &'static str {
        match self {
            EvidenceDimension::PathogenSpecificity => "pathogen_specificity",
            EvidenceDimension::TargetImpact => "target_impact",
            EvidenceDimension::MlScore => "ml_score",
        }
    }

    /// Name of the raw value column in the producing evidence table.
    pub fn raw_column(self) -> &'static str {
        match self {
            EvidenceDimension::PathogenSpecificity => "pathogen_specificity_raw",
            EvidenceDimension::TargetImpact => "target_impact_raw",
            EvidenceDimension::MlScore => "ml_score_raw",
        }
    }

    /// Normalisation applied when the configuration does not override it.
    /// Counts are unbounded; the classifier output is a probability.
    pub fn default_method(self) -> NormalisationMethod {
        match self {
            EvidenceDimension::PathogenSpecificity => NormalisationMethod::MinMax,
            EvidenceDimension::TargetImpact => NormalisationMethod::MinMax,
            EvidenceDimension::MlScore => NormalisationMethod::Bounded { min: 0.0, max: 1.0 },
        }
    }
}

impl fmt::Display for EvidenceDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EvidenceDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "pathogenspecificity" | "specificity" => Ok(EvidenceDimension::PathogenSpecificity),
            "targetimpact" | "target" => Ok(EvidenceDimension::TargetImpact),
            "mlscore" | "ml" => Ok(EvidenceDimension::MlScore),
            _ => Err(format!("unknown evidence dimension: {s}")),
        }
    }
}

/// Fixed-size map with one slot per [`EvidenceDimension`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionMap<T> {
    values: [T; 3],
}

impl<T> DimensionMap<T> {
    pub fn from_fn(mut f: impl FnMut(EvidenceDimension) -> T) -> Self {
        Self {
            values: EvidenceDimension::ALL.map(&mut f),
        }
    }

    pub fn get(&self, dimension: EvidenceDimension) -> &T {
        &self.values[dimension.index()]
    }

    pub fn set(&mut self, dimension: EvidenceDimension, value: T) {
        self.values[dimension.index()] = value;
    }

    /// Iterate in canonical dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (EvidenceDimension, &T)> + '_ {
        EvidenceDimension::ALL.into_iter().zip(self.values.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(EvidenceDimension, &T) -> U) -> DimensionMap<U> {
        DimensionMap::from_fn(|d| f(d, self.get(d)))
    }
}

impl<T> Index<EvidenceDimension> for DimensionMap<T> {
    type Output = T;

    fn index(&self, dimension: EvidenceDimension) -> &T {
        self.get(dimension)
    }
}

impl<T> IndexMut<EvidenceDimension> for DimensionMap<T> {
    fn index_mut(&mut self, dimension: EvidenceDimension) -> &mut T {
        &mut self.values[dimension.index()]
    }
}

/// How raw values of one dimension are rescaled onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum NormalisationMethod {
    /// Known theoretical range: clamp into `[min, max]`, then rescale.
    Bounded { min: f64, max: f64 },
    /// Batch min-max over observed values.
    MinMax,
    /// Average rank over observed values divided by the observed count.
    Rank,
}

impl NormalisationMethod {
    pub fn name(&self) -> &'static str {
        match self {
            NormalisationMethod::Bounded { .. } => "bounded",
            NormalisationMethod::MinMax => "min_max",
            NormalisationMethod::Rank => "rank",
        }
    }
}

/// How predicted metabolite-target interactions collapse into one raw
/// target-impact value per metabolite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAggregation {
    /// Number of significant host genes targeted.
    #[default]
    Count,
    /// Sum of interaction confidences over significant targets.
    ConfidenceSum,
    /// Strongest single interaction confidence.
    MaxConfidence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_order_is_stable() {
        let indices: Vec<usize> = EvidenceDimension::ALL.iter().map(|d| d.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_dimension_parse_accepts_aliases() {
        assert_eq!("PathogenSpecificity".parse::<EvidenceDimension>(), Ok(EvidenceDimension::PathogenSpecificity));
        assert_eq!("target_impact".parse::<EvidenceDimension>(), Ok(EvidenceDimension::TargetImpact));
        assert_eq!("MLScore".parse::<EvidenceDimension>(), Ok(EvidenceDimension::MlScore));
        assert!("docking".parse::<EvidenceDimension>().is_err());
    }

    #[test]
    fn test_dimension_map_indexing() {
        let mut map = DimensionMap::from_fn(|d| d.index() as f64);
        assert_eq!(map[EvidenceDimension::MlScore], 2.0);
        map[EvidenceDimension::MlScore] = 7.5;
        map.set(EvidenceDimension::TargetImpact, 3.0);
        let collected: Vec<f64> = map.iter().map(|(_, v)| *v).collect();
        assert_eq!(collected, vec![0.0, 3.0, 7.5]);
    }

    #[test]
    fn test_method_serde_tagged() {
        let yaml = "method: bounded\nmin: 0.0\nmax: 10.0\n";
        let method: NormalisationMethod = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(method, NormalisationMethod::Bounded { min: 0.0, max: 10.0 });

        let method: NormalisationMethod = serde_yaml::from_str("method: rank").unwrap();
        assert_eq!(method, NormalisationMethod::Rank);
    }
}
