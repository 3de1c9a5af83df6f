//! Weight vector for the composite metabolite score.

use metabolyx_common::{DimensionMap, EvidenceDimension, ScoringConfig};
use serde::{Deserialize, Serialize};

use crate::error::{RankError, Result};

/// The 3-component weight vector W.
/// Weights need not sum to 1.0: the scorer renormalises them per metabolite
/// over the dimensions that metabolite actually has.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    /// Presence in pathogenic strains, absence from commensals
    pub pathogen_specificity: f64,
    /// Interactions with host activation-signature genes
    pub target_impact: f64,
    /// Classifier immunomodulatory probability
    pub ml_score: f64,
}

impl Default for WeightVector {
    /// Equal weighting: every dimension counts the same.
    fn default() -> Self {
        Self::equal()
    }
}

impl From<&ScoringConfig> for WeightVector {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            pathogen_specificity: config.pathogen_specificity,
            target_impact: config.target_impact,
            ml_score: config.ml_score,
        }
    }
}

impl WeightVector {
    pub fn new(pathogen_specificity: f64, target_impact: f64, ml_score: f64) -> Self {
        Self {
            pathogen_specificity,
            target_impact,
            ml_score,
        }
    }

    pub fn equal() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    pub fn weight(&self, dimension: EvidenceDimension) -> f64 {
        match dimension {
            EvidenceDimension::PathogenSpecificity => self.pathogen_specificity,
            EvidenceDimension::TargetImpact => self.target_impact,
            EvidenceDimension::MlScore => self.ml_score,
        }
    }

    /// Every weight finite and non-negative, at least one positive, and a
    /// finite total.
    pub fn validate(&self) -> Result<()> {
        for (dimension, &w) in self.as_map().iter() {
            if !w.is_finite() || w < 0.0 {
                return Err(RankError::InvalidWeights(format!(
                    "weight for {dimension} must be finite and non-negative, got {w}"
                )));
            }
        }
        let sum = self.sum();
        if sum <= 0.0 {
            return Err(RankError::InvalidWeights("all weights are zero".to_string()));
        }
        if !sum.is_finite() {
            return Err(RankError::InvalidWeights(format!("weights overflow when summed ({sum})")));
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.pathogen_specificity + self.target_impact + self.ml_score
    }

    /// Convert to a per-dimension map for iteration.
    pub fn as_map(&self) -> DimensionMap<f64> {
        DimensionMap::from_fn(|d| self.weight(d))
    }

    /// Weights resolved for one metabolite: renormalised over the present
    /// dimensions, zero elsewhere. `None` when the present dimensions carry
    /// no weight at all.
    pub fn resolve(&self, present: &DimensionMap<bool>) -> Option<DimensionMap<f64>> {
        let denominator: f64 = present
            .iter()
            .filter(|(_, &p)| p)
            .map(|(d, _)| self.weight(d))
            .sum();
        if denominator <= 0.0 {
            return None;
        }
        Some(DimensionMap::from_fn(|d| {
            if present[d] {
                self.weight(d) / denominator
            } else {
                0.0
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        let w = WeightVector::default();
        assert!(w.validate().is_ok());
        assert_eq!(w.sum(), 3.0);
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        assert!(WeightVector::new(0.0, 0.0, 0.0).validate().is_err());
        assert!(WeightVector::new(-1.0, 1.0, 1.0).validate().is_err());
        assert!(WeightVector::new(f64::NAN, 1.0, 1.0).validate().is_err());
        assert!(WeightVector::new(0.0, 0.0, 0.5).validate().is_ok());
        assert!(WeightVector::new(f64::MAX, f64::MAX, 1.0).validate().is_err());
    }

    #[test]
    fn test_resolve_renormalises_over_present() {
        let w = WeightVector::new(1.0, 2.0, 1.0);
        let present = DimensionMap::from_fn(|d| d != EvidenceDimension::TargetImpact);
        let resolved = w.resolve(&present).unwrap();
        assert_eq!(resolved[EvidenceDimension::PathogenSpecificity], 0.5);
        assert_eq!(resolved[EvidenceDimension::TargetImpact], 0.0);
        assert_eq!(resolved[EvidenceDimension::MlScore], 0.5);
    }

    #[test]
    fn test_resolve_zero_weight_only_is_none() {
        let w = WeightVector::new(0.0, 1.0, 1.0);
        let present = DimensionMap::from_fn(|d| d == EvidenceDimension::PathogenSpecificity);
        assert_eq!(w.resolve(&present), None);
    }

    #[test]
    fn test_from_scoring_config() {
        let config = ScoringConfig {
            pathogen_specificity: 0.2,
            target_impact: 0.3,
            ml_score: 0.5,
            require_pathogen_presence: false,
        };
        let w = WeightVector::from(&config);
        assert_eq!(w.weight(EvidenceDimension::MlScore), 0.5);
    }
}
