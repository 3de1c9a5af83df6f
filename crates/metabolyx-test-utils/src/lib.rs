//! Shared fixtures for Metabolyx tests.

use metabolyx_common::EvidenceDimension;
use metabolyx_ranker::table::METABOLITE_ID;
use metabolyx_ranker::{EvidenceTable, EvidenceTables, TableKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default pathogen panel columns, in presence-table order.
pub const PATHOGEN_STRAINS: [&str; 4] = ["Sp_ATCC49619", "Sp_TIGR4", "Sp_R6", "Sp_D39"];
pub const COMMENSAL_STRAINS: [&str; 1] = ["Ssal_K12"];

/// Two-column `{metabolite_id, <dimension>_raw}` table. `None` becomes an empty cell.
pub fn dimension_table(dimension: EvidenceDimension, rows: &[(&str, Option<f64>)]) -> EvidenceTable {
    rows.iter().fold(
        EvidenceTable::new(&[METABOLITE_ID, dimension.raw_column()]),
        |table, (id, value)| table.with_row(&[id.to_string(), cell(*value)]),
    )
}

/// Three metabolites across all dimension tables:
///
/// | id | specificity | target impact | ml  |
/// |----|-------------|---------------|-----|
/// | A  | 5           | 0.9           | 0.8 |
/// | B  | 3           | –             | 0.6 |
/// | C  | 5           | 0.9           | –   |
pub fn example_tables() -> EvidenceTables {
    EvidenceTables::new()
        .with(
            TableKind::Specificity,
            dimension_table(
                EvidenceDimension::PathogenSpecificity,
                &[("A", Some(5.0)), ("B", Some(3.0)), ("C", Some(5.0))],
            ),
        )
        .with(
            TableKind::TargetImpact,
            dimension_table(
                EvidenceDimension::TargetImpact,
                &[("A", Some(0.9)), ("B", None), ("C", Some(0.9))],
            ),
        )
        .with(
            TableKind::MlScore,
            dimension_table(
                EvidenceDimension::MlScore,
                &[("A", Some(0.8)), ("B", Some(0.6)), ("C", None)],
            ),
        )
}

/// Presence matrix over the default strain panel. Each row lists the strains
/// carrying the metabolite.
pub fn presence_table(rows: &[(&str, &[&str])]) -> EvidenceTable {
    let headers: Vec<&str> = std::iter::once(METABOLITE_ID)
        .chain(PATHOGEN_STRAINS)
        .chain(COMMENSAL_STRAINS)
        .collect();
    let strains = &headers[1..];
    rows.iter().fold(EvidenceTable::new(&headers), |table, (id, carried)| {
        let cells: Vec<String> = std::iter::once(id.to_string())
            .chain(
                strains
                    .iter()
                    .map(|s| if carried.contains(s) { "1" } else { "0" }.to_string()),
            )
            .collect();
        table.with_row(&cells)
    })
}

/// Seeded random evidence for `n` metabolites. Every metabolite appears in
/// every table; roughly a fifth of the cells are missing.
pub fn random_tables(seed: u64, n: usize) -> EvidenceTables {
    let mut rng = StdRng::seed_from_u64(seed);
    let ids: Vec<String> = (0..n).map(metabolite_id).collect();

    let mut specificity = EvidenceTable::new(&[METABOLITE_ID, EvidenceDimension::PathogenSpecificity.raw_column()]);
    let mut target = EvidenceTable::new(&[METABOLITE_ID, EvidenceDimension::TargetImpact.raw_column()]);
    let mut ml = EvidenceTable::new(&[METABOLITE_ID, EvidenceDimension::MlScore.raw_column()]);

    for id in &ids {
        let s = maybe(&mut rng, |r| r.gen_range(0..=5) as f64);
        let t = maybe(&mut rng, |r| r.gen_range(0..=12) as f64);
        let m = maybe(&mut rng, |r| r.gen::<f64>());
        specificity.push_row(vec![id.clone(), cell(s)]);
        target.push_row(vec![id.clone(), cell(t)]);
        ml.push_row(vec![id.clone(), cell(m)]);
    }

    EvidenceTables::new()
        .with(TableKind::Specificity, specificity)
        .with(TableKind::TargetImpact, target)
        .with(TableKind::MlScore, ml)
}

/// Zero-padded identifier so lexicographic and numeric order agree.
pub fn metabolite_id(i: usize) -> String {
    format!("M{i:04}")
}

fn maybe(rng: &mut StdRng, f: impl FnOnce(&mut StdRng) -> f64) -> Option<f64> {
    if rng.gen_bool(0.2) {
        None
    } else {
        Some(f(rng))
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_tables_are_seeded() {
        assert_eq!(random_tables(7, 30), random_tables(7, 30));
        assert_ne!(random_tables(7, 30), random_tables(8, 30));
    }

    #[test]
    fn test_presence_table_layout() {
        let table = presence_table(&[("ToxinA", &["Sp_TIGR4", "Ssal_K12"])]);
        assert_eq!(table.headers.len(), 6);
        assert_eq!(table.rows[0], vec!["ToxinA", "0", "1", "0", "0", "1"]);
    }
}
