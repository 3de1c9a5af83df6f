//! In-memory evidence tables as handed over by upstream collaborators.
//!
//! Tables are column-named grids of text cells, the lowest common
//! denominator of the CSV/TSV/JSON producers. Typed interpretation happens
//! in the loader.

use metabolyx_common::EvidenceDimension;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RankError, Result};

/// Key column shared by every evidence table.
pub const METABOLITE_ID: &str = "metabolite_id";

/// Cell spellings that mean "no value".
const MISSING_MARKERS: &[&str] = &["", "na", "nan", "null", "none"];

/// The four evidence tables the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// {metabolite_id, pathogen_specificity_raw}
    Specificity,
    /// {metabolite_id, [name], [formula], <strain>...}
    Presence,
    /// {metabolite_id, target_impact_raw}
    TargetImpact,
    /// {metabolite_id, ml_score_raw}
    MlScore,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Specificity,
        TableKind::Presence,
        TableKind::TargetImpact,
        TableKind::MlScore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Specificity => "specificity",
            TableKind::Presence => "presence",
            TableKind::TargetImpact => "target_impact",
            TableKind::MlScore => "ml_score",
        }
    }

    /// Evidence dimension carried by the table, if any.
    pub fn dimension(self) -> Option<EvidenceDimension> {
        match self {
            TableKind::Specificity => Some(EvidenceDimension::PathogenSpecificity),
            TableKind::Presence => None,
            TableKind::TargetImpact => Some(EvidenceDimension::TargetImpact),
            TableKind::MlScore => Some(EvidenceDimension::MlScore),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A header row plus data rows of text cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl EvidenceTable {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row (builder style, used heavily by tests and providers).
    pub fn with_row<S: AsRef<str>>(mut self, cells: &[S]) -> Self {
        self.push_row(cells.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column index by name; trims and ignores ASCII case.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    pub fn require_column(&self, table: &str, name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| {
            RankError::schema(
                table,
                format!("required column '{name}' is absent (found: {})", self.headers.join(", ")),
            )
        })
    }

    /// Every row must have exactly one cell per header.
    pub fn check_shape(&self, table: &str) -> Result<()> {
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.headers.len() {
                return Err(RankError::schema(
                    table,
                    format!(
                        "row {} has {} cells, expected {}",
                        i + 1,
                        row.len(),
                        self.headers.len()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Cell text, trimmed.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows[row][column].trim()
    }
}

/// Parse a cell into an optional real value.
///
/// Missing markers yield `Ok(None)`. Infinite values are rejected along with
/// unparseable text (the error carries the offending text); NaN counts as missing.
pub fn parse_value(cell: &str) -> std::result::Result<Option<f64>, String> {
    let text = cell.trim();
    if MISSING_MARKERS.iter().any(|m| text.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(text.to_string()),
    }
}

/// The bundle of tables handed to one ranking pass. Any subset may be supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceTables {
    pub specificity: Option<EvidenceTable>,
    pub presence: Option<EvidenceTable>,
    pub target_impact: Option<EvidenceTable>,
    pub ml_score: Option<EvidenceTable>,
}

impl EvidenceTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: TableKind, table: EvidenceTable) -> Self {
        self.set(kind, table);
        self
    }

    pub fn set(&mut self, kind: TableKind, table: EvidenceTable) {
        *self.slot_mut(kind) = Some(table);
    }

    pub fn get(&self, kind: TableKind) -> Option<&EvidenceTable> {
        match kind {
            TableKind::Specificity => self.specificity.as_ref(),
            TableKind::Presence => self.presence.as_ref(),
            TableKind::TargetImpact => self.target_impact.as_ref(),
            TableKind::MlScore => self.ml_score.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: TableKind) -> &mut Option<EvidenceTable> {
        match kind {
            TableKind::Specificity => &mut self.specificity,
            TableKind::Presence => &mut self.presence,
            TableKind::TargetImpact => &mut self.target_impact,
            TableKind::MlScore => &mut self.ml_score,
        }
    }

    /// Supplied tables in canonical order.
    pub fn supplied(&self) -> impl Iterator<Item = (TableKind, &EvidenceTable)> + '_ {
        TableKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|t| (kind, t)))
    }

    pub fn is_empty(&self) -> bool {
        self.supplied().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_missing_markers() {
        assert_eq!(parse_value(""), Ok(None));
        assert_eq!(parse_value("  NA "), Ok(None));
        assert_eq!(parse_value("NaN"), Ok(None));
        assert_eq!(parse_value("null"), Ok(None));
        assert_eq!(parse_value("0.25"), Ok(Some(0.25)));
        assert_eq!(parse_value("-3"), Ok(Some(-3.0)));
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        assert!(parse_value("high").is_err());
        assert!(parse_value("inf").is_err());
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = EvidenceTable::new(&["Metabolite_ID ", "ml_score_raw"]);
        assert_eq!(table.column(METABOLITE_ID), Some(0));
        assert_eq!(table.column("ML_SCORE_RAW"), Some(1));
        assert!(table.require_column("ml_score", "target_impact_raw").is_err());
    }

    #[test]
    fn test_check_shape_flags_ragged_rows() {
        let table = EvidenceTable::new(&[METABOLITE_ID, "ml_score_raw"])
            .with_row(&["A", "0.5"])
            .with_row(&["B"]);
        let err = table.check_shape("ml_score").unwrap_err();
        assert!(err.to_string().contains("row 2 has 1 cells"));
    }

    #[test]
    fn test_supplied_in_canonical_order() {
        let tables = EvidenceTables::new()
            .with(TableKind::MlScore, EvidenceTable::new(&[METABOLITE_ID]))
            .with(TableKind::Specificity, EvidenceTable::new(&[METABOLITE_ID]));
        let kinds: Vec<TableKind> = tables.supplied().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![TableKind::Specificity, TableKind::MlScore]);
        assert!(!tables.is_empty());
        assert!(EvidenceTables::new().is_empty());
    }
}
