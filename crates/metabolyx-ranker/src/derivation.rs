//! Derivation of engine-ready evidence tables from upstream stage outputs.
//!
//! Upstream stages publish a differential-expression table, a
//! metabolite-target interaction list and a strain presence matrix. These
//! helpers reduce them to the `{metabolite_id, <dimension>_raw}` shape the
//! loader expects.

use metabolyx_common::{EvidenceDimension, StrainPanel, TargetAggregation};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{RankError, Result};
use crate::table::{parse_value, EvidenceTable, METABOLITE_ID};

pub const GENE: &str = "gene";
pub const PADJ: &str = "padj";
pub const TARGET_GENE: &str = "target_gene";
pub const CONFIDENCE: &str = "confidence";

const SIGNATURE: &str = "signature";
const INTERACTIONS: &str = "interactions";
const PRESENCE: &str = "presence";

fn invalid(table: &str, row: usize, column: &str, value: String) -> RankError {
    RankError::InvalidValue {
        table: table.to_string(),
        row: row + 1,
        column: column.to_string(),
        value,
    }
}

/// Host genes whose adjusted p-value is below `padj_threshold`.
/// Genes with a missing p-value are never significant.
pub fn significant_genes(dge: &EvidenceTable, padj_threshold: f64) -> Result<BTreeSet<String>> {
    dge.check_shape(SIGNATURE)?;
    let gene_col = dge.require_column(SIGNATURE, GENE)?;
    let padj_col = dge.require_column(SIGNATURE, PADJ)?;

    let mut genes = BTreeSet::new();
    for row in 0..dge.len() {
        let padj = parse_value(dge.cell(row, padj_col)).map_err(|v| invalid(SIGNATURE, row, PADJ, v))?;
        let gene = dge.cell(row, gene_col);
        if !gene.is_empty() && padj.is_some_and(|p| p < padj_threshold) {
            genes.insert(gene.to_string());
        }
    }

    tracing::info!(significant = genes.len(), total = dge.len(), padj_threshold, "activation signature");
    Ok(genes)
}

/// Reduce predicted interactions to one target-impact value per metabolite.
///
/// Only interactions with a gene in `significant` survive. Metabolites left
/// without any surviving interaction are omitted, so the loader sees them as
/// missing rather than as zero impact. The confidence column is only needed
/// for confidence-based aggregations.
pub fn target_impact_table(
    interactions: &EvidenceTable,
    significant: &BTreeSet<String>,
    aggregation: TargetAggregation,
) -> Result<EvidenceTable> {
    interactions.check_shape(INTERACTIONS)?;
    let id_col = interactions.require_column(INTERACTIONS, METABOLITE_ID)?;
    let gene_col = interactions.require_column(INTERACTIONS, TARGET_GENE)?;
    let confidence_col = match aggregation {
        TargetAggregation::Count => None,
        _ => Some(interactions.require_column(INTERACTIONS, CONFIDENCE)?),
    };

    // metabolite → gene → strongest confidence; duplicate pairs count once
    let mut hits: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for row in 0..interactions.len() {
        let gene = interactions.cell(row, gene_col);
        if !significant.contains(gene) {
            continue;
        }
        let id = interactions.cell(row, id_col);
        if id.is_empty() {
            return Err(RankError::Schema {
                table: INTERACTIONS.to_string(),
                message: format!("row {} has an empty {METABOLITE_ID}", row + 1),
            });
        }
        let confidence = match confidence_col {
            Some(col) => parse_value(interactions.cell(row, col))
                .map_err(|v| invalid(INTERACTIONS, row, CONFIDENCE, v))?
                .unwrap_or(0.0),
            None => 1.0,
        };
        let slot = hits
            .entry(id.to_string())
            .or_default()
            .entry(gene.to_string())
            .or_insert(f64::NEG_INFINITY);
        *slot = slot.max(confidence);
    }

    let raw_column = EvidenceDimension::TargetImpact.raw_column();
    let mut table = EvidenceTable::new(&[METABOLITE_ID, raw_column]);
    for (id, targets) in &hits {
        let value = match aggregation {
            TargetAggregation::Count => targets.len() as f64,
            TargetAggregation::ConfidenceSum => targets.values().sum(),
            TargetAggregation::MaxConfidence => targets.values().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        table.push_row(vec![id.clone(), value.to_string()]);
    }

    tracing::info!(
        metabolites = table.len(),
        interactions = interactions.len(),
        ?aggregation,
        "target impact derived"
    );
    Ok(table)
}

/// Pathogen specificity per metabolite from the strain presence matrix:
/// the number of pathogenic strains carrying it, plus the panel's bonus when
/// no commensal strain carries it.
pub fn specificity_table(presence: &EvidenceTable, panel: &StrainPanel) -> Result<EvidenceTable> {
    presence.check_shape(PRESENCE)?;
    let id_col = presence.require_column(PRESENCE, METABOLITE_ID)?;
    let pathogen_cols = panel
        .pathogen
        .iter()
        .map(|s| presence.require_column(PRESENCE, s).map(|c| (c, s.as_str())))
        .collect::<Result<Vec<_>>>()?;
    let commensal_cols = panel
        .commensal
        .iter()
        .map(|s| presence.require_column(PRESENCE, s).map(|c| (c, s.as_str())))
        .collect::<Result<Vec<_>>>()?;

    let carried = |row: usize, col: usize, strain: &str| -> Result<bool> {
        parse_value(presence.cell(row, col))
            .map(|v| v.is_some_and(|x| x > 0.0))
            .map_err(|v| invalid(PRESENCE, row, strain, v))
    };

    let raw_column = EvidenceDimension::PathogenSpecificity.raw_column();
    let mut table = EvidenceTable::new(&[METABOLITE_ID, raw_column]);
    for row in 0..presence.len() {
        let mut score = 0.0;
        for &(col, strain) in &pathogen_cols {
            if carried(row, col, strain)? {
                score += 1.0;
            }
        }
        let mut in_commensal = false;
        for &(col, strain) in &commensal_cols {
            in_commensal |= carried(row, col, strain)?;
        }
        if !in_commensal {
            score += panel.commensal_absence_bonus;
        }
        table.push_row(vec![presence.cell(row, id_col).to_string(), score.to_string()]);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dge() -> EvidenceTable {
        EvidenceTable::new(&[GENE, "log2FoldChange", PADJ])
            .with_row(&["NFKB1", "2.1", "0.001"])
            .with_row(&["TNF", "3.4", "0.0499"])
            .with_row(&["IL6", "1.2", "0.05"])
            .with_row(&["ACTB", "0.0", "NA"])
    }

    fn interactions() -> EvidenceTable {
        EvidenceTable::new(&[METABOLITE_ID, TARGET_GENE, CONFIDENCE])
            .with_row(&["ToxinA", "NFKB1", "0.9"])
            .with_row(&["ToxinA", "TNF", "0.5"])
            .with_row(&["ToxinA", "TNF", "0.7"])
            .with_row(&["Pyruvate", "IL6", "0.8"])
            .with_row(&["Choline", "NFKB1", "0.4"])
    }

    #[test]
    fn test_significant_genes_threshold_is_strict() {
        let genes = significant_genes(&dge(), 0.05).unwrap();
        let genes: Vec<&str> = genes.iter().map(String::as_str).collect();
        assert_eq!(genes, vec!["NFKB1", "TNF"]);
    }

    #[test]
    fn test_significant_genes_requires_padj() {
        let table = EvidenceTable::new(&[GENE, "pvalue"]).with_row(&["TNF", "0.01"]);
        assert!(matches!(significant_genes(&table, 0.05), Err(RankError::Schema { .. })));
    }

    #[test]
    fn test_target_impact_count_filters_non_significant() {
        let significant = significant_genes(&dge(), 0.05).unwrap();
        let table = target_impact_table(&interactions(), &significant, TargetAggregation::Count).unwrap();
        assert_eq!(table.headers, vec![METABOLITE_ID.to_string(), "target_impact_raw".to_string()]);
        // Pyruvate only hits IL6 (not significant) and is omitted
        assert_eq!(
            table.rows,
            vec![
                vec!["Choline".to_string(), "1".to_string()],
                vec!["ToxinA".to_string(), "2".to_string()],
            ]
        );
    }

    #[test]
    fn test_target_impact_confidence_aggregations() {
        let significant = significant_genes(&dge(), 0.05).unwrap();
        let sum = target_impact_table(&interactions(), &significant, TargetAggregation::ConfidenceSum).unwrap();
        // ToxinA: NFKB1 0.9 + TNF max(0.5, 0.7)
        let toxin: f64 = sum.rows[1][1].parse().unwrap();
        assert!((toxin - 1.6).abs() < 1e-12);

        let max = target_impact_table(&interactions(), &significant, TargetAggregation::MaxConfidence).unwrap();
        assert_eq!(max.rows[1][1], "0.9");
    }

    #[test]
    fn test_count_does_not_need_confidence() {
        let table = EvidenceTable::new(&[METABOLITE_ID, TARGET_GENE]).with_row(&["ToxinA", "TNF"]);
        let significant: BTreeSet<String> = ["TNF".to_string()].into_iter().collect();
        let derived = target_impact_table(&table, &significant, TargetAggregation::Count).unwrap();
        assert_eq!(derived.len(), 1);
        assert!(target_impact_table(&table, &significant, TargetAggregation::ConfidenceSum).is_err());
    }

    #[test]
    fn test_specificity_from_presence() {
        let presence = EvidenceTable::new(&[METABOLITE_ID, "Sp_ATCC49619", "Sp_TIGR4", "Sp_R6", "Sp_D39", "Ssal_K12"])
            .with_row(&["ToxinA", "1", "1", "1", "0", "0"])
            .with_row(&["D-Glucose", "1", "1", "1", "1", "1"])
            .with_row(&["Salivaricin", "0", "0", "0", "0", "1"]);
        let table = specificity_table(&presence, &StrainPanel::default()).unwrap();
        let scores: Vec<(&str, &str)> = table.rows.iter().map(|r| (r[0].as_str(), r[1].as_str())).collect();
        assert_eq!(scores, vec![("ToxinA", "4"), ("D-Glucose", "4"), ("Salivaricin", "0")]);
    }

    #[test]
    fn test_specificity_requires_panel_columns() {
        let presence = EvidenceTable::new(&[METABOLITE_ID, "Sp_TIGR4"]).with_row(&["ToxinA", "1"]);
        let err = specificity_table(&presence, &StrainPanel::default()).unwrap_err();
        assert!(err.to_string().contains("Sp_ATCC49619"));
    }
}
