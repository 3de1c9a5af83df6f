//! Ranking configuration.
//!
//! Users tune the composite score through a YAML, TOML or JSON file: the
//! weight of each evidence dimension, how each dimension is normalised, the
//! strain panel used to derive pathogen specificity, and output options.
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MetabolyxError, Result};
use crate::evidence::{EvidenceDimension, NormalisationMethod, TargetAggregation};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "METABOLYX_CONFIG";

/// Complete ranking run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Composite score weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Normalisation method per dimension
    #[serde(default)]
    pub normalisation: NormalisationConfig,

    /// Pathogen / commensal strain columns of the presence table
    #[serde(default)]
    pub strains: StrainPanel,

    /// Host gene signature and interaction aggregation
    #[serde(default)]
    pub signature: SignatureConfig,

    /// Output options
    #[serde(default)]
    pub output: OutputConfig,
}

// ── Scoring ───────────────────────────────────────────────────────────────────

/// Per-dimension weights for the composite score.
/// Weights need not sum to 1.0; the scorer renormalises per metabolite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_weight")]
    pub pathogen_specificity: f64,

    #[serde(default = "default_weight")]
    pub target_impact: f64,

    #[serde(default = "default_weight")]
    pub ml_score: f64,

    /// Exclude metabolites found in no pathogenic strain
    #[serde(default)]
    pub require_pathogen_presence: bool,
}

fn default_weight() -> f64 { 1.0 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pathogen_specificity: default_weight(),
            target_impact: default_weight(),
            ml_score: default_weight(),
            require_pathogen_presence: false,
        }
    }
}

impl ScoringConfig {
    pub fn weight(&self, dimension: EvidenceDimension) -> f64 {
        match dimension {
            EvidenceDimension::PathogenSpecificity => self.pathogen_specificity,
            EvidenceDimension::TargetImpact => self.target_impact,
            EvidenceDimension::MlScore => self.ml_score,
        }
    }
}

// ── Normalisation ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalisationConfig {
    #[serde(default = "default_specificity_method")]
    pub pathogen_specificity: NormalisationMethod,

    #[serde(default = "default_target_method")]
    pub target_impact: NormalisationMethod,

    #[serde(default = "default_ml_method")]
    pub ml_score: NormalisationMethod,
}

fn default_specificity_method() -> NormalisationMethod {
    EvidenceDimension::PathogenSpecificity.default_method()
}
fn default_target_method() -> NormalisationMethod {
    EvidenceDimension::TargetImpact.default_method()
}
fn default_ml_method() -> NormalisationMethod {
    EvidenceDimension::MlScore.default_method()
}

impl Default for NormalisationConfig {
    fn default() -> Self {
        Self {
            pathogen_specificity: default_specificity_method(),
            target_impact: default_target_method(),
            ml_score: default_ml_method(),
        }
    }
}

impl NormalisationConfig {
    pub fn method(&self, dimension: EvidenceDimension) -> NormalisationMethod {
        match dimension {
            EvidenceDimension::PathogenSpecificity => self.pathogen_specificity,
            EvidenceDimension::TargetImpact => self.target_impact,
            EvidenceDimension::MlScore => self.ml_score,
        }
    }
}

// ── Strain panel ──────────────────────────────────────────────────────────────

/// Strain columns of the presence/absence table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainPanel {
    #[serde(default = "default_pathogen_strains")]
    pub pathogen: Vec<String>,

    #[serde(default = "default_commensal_strains")]
    pub commensal: Vec<String>,

    /// Added to the specificity count when a metabolite is absent from
    /// every commensal strain
    #[serde(default = "default_commensal_bonus")]
    pub commensal_absence_bonus: f64,
}

fn default_pathogen_strains() -> Vec<String> {
    ["Sp_ATCC49619", "Sp_TIGR4", "Sp_R6", "Sp_D39"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_commensal_strains() -> Vec<String> { vec!["Ssal_K12".to_string()] }
fn default_commensal_bonus() -> f64 { 1.0 }

impl Default for StrainPanel {
    fn default() -> Self {
        Self {
            pathogen: default_pathogen_strains(),
            commensal: default_commensal_strains(),
            commensal_absence_bonus: default_commensal_bonus(),
        }
    }
}

// ── Signature ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// Adjusted p-value below which a host gene joins the activation signature
    #[serde(default = "default_padj_threshold")]
    pub padj_threshold: f64,

    #[serde(default)]
    pub target_aggregation: TargetAggregation,
}

fn default_padj_threshold() -> f64 { 0.05 }

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            padj_threshold: default_padj_threshold(),
            target_aggregation: TargetAggregation::default(),
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Number of top candidates exported as radar profiles
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Also write the per-dimension normalised score table
    #[serde(default = "default_true")]
    pub include_normalised: bool,
}

fn default_top_n() -> usize { 5 }
fn default_true() -> bool { true }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            top_n: default_top_n(),
            include_normalised: default_true(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RankingConfig {
    /// Load from a file, picking the parser from the extension
    /// (`.toml`, `.json`, anything else is read as YAML).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: RankingConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for a run.
    /// An explicit path wins over `METABOLYX_CONFIG`; with neither, defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => {
                if !Path::new(&path).exists() {
                    return Err(MetabolyxError::Config(format!(
                        "{CONFIG_ENV_VAR} points to a missing file: {path}"
                    )));
                }
                Self::from_path(&path)
            }
            _ => {
                tracing::debug!("no configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let mut any_positive = false;
        for dimension in EvidenceDimension::ALL {
            let w = self.scoring.weight(dimension);
            if !w.is_finite() || w < 0.0 {
                return Err(MetabolyxError::Config(format!(
                    "weight for {dimension} must be a finite non-negative number, got {w}"
                )));
            }
            any_positive |= w > 0.0;

            if let NormalisationMethod::Bounded { min, max } = self.normalisation.method(dimension) {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(MetabolyxError::Config(format!(
                        "bounded range for {dimension} must satisfy min < max, got [{min}, {max}]"
                    )));
                }
            }
        }
        if !any_positive {
            return Err(MetabolyxError::Config("at least one weight must be positive".to_string()));
        }

        let t = self.signature.padj_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(MetabolyxError::Config(format!(
                "padj_threshold must lie in (0, 1], got {t}"
            )));
        }
        if !self.strains.commensal_absence_bonus.is_finite() || self.strains.commensal_absence_bonus < 0.0 {
            return Err(MetabolyxError::Config(
                "commensal_absence_bonus must be a finite non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = RankingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.weight(EvidenceDimension::MlScore), 1.0);
        assert_eq!(config.strains.pathogen.len(), 4);
        assert_eq!(config.strains.commensal, vec!["Ssal_K12".to_string()]);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let parsed: RankingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(parsed, RankingConfig::default());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
scoring:
  ml_score: 2.0
normalisation:
  target_impact:
    method: rank
signature:
  target_aggregation: confidence_sum
"#;
        let parsed: RankingConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.scoring.ml_score, 2.0);
        assert_eq!(parsed.scoring.target_impact, 1.0);
        assert_eq!(parsed.normalisation.target_impact, NormalisationMethod::Rank);
        assert_eq!(parsed.signature.target_aggregation, TargetAggregation::ConfidenceSum);
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let mut config = RankingConfig::default();
        config.scoring.pathogen_specificity = 0.0;
        config.scoring.target_impact = 0.0;
        config.scoring.ml_score = 0.0;
        assert!(matches!(config.validate(), Err(MetabolyxError::Config(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = RankingConfig::default();
        config.scoring.target_impact = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_bounded_range_rejected() {
        let mut config = RankingConfig::default();
        config.normalisation.ml_score = NormalisationMethod::Bounded { min: 1.0, max: 0.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = RankingConfig::default();
        let yaml = config.to_yaml_string().unwrap();
        let parsed: RankingConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("ranking.toml");
        std::fs::write(&toml_path, "[scoring]\ntarget_impact = 0.5\n").unwrap();
        let from_toml = RankingConfig::from_path(&toml_path).unwrap();
        assert_eq!(from_toml.scoring.target_impact, 0.5);

        let json_path = dir.path().join("ranking.json");
        std::fs::write(&json_path, r#"{"output": {"format": "json", "top_n": 3}}"#).unwrap();
        let from_json = RankingConfig::from_path(&json_path).unwrap();
        assert_eq!(from_json.output.format, OutputFormat::Json);
        assert_eq!(from_json.output.top_n, 3);
    }
}
