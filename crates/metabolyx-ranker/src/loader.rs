//! Evidence table loader.
//!
//! Validates the supplied tables and folds them into one immutable
//! [`MetaboliteRecord`] per metabolite. Metabolites missing from some tables
//! are kept with missing raw values; nothing is dropped here.

use metabolyx_common::{DimensionMap, EvidenceDimension};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{RankError, Result};
use crate::table::{parse_value, EvidenceTable, EvidenceTables, TableKind, METABOLITE_ID};

/// Optional descriptive columns of the presence table. Every other non-key
/// column of that table is a strain.
const NAME_COLUMNS: &[&str] = &["name", "display_name"];
const FORMULA_COLUMN: &str = "formula";

/// One metabolite with its raw evidence, created once per load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaboliteRecord {
    pub id: String,
    pub name: String,
    pub formula: Option<String>,
    /// Strains the metabolite was reconstructed in; `None` when the
    /// metabolite is absent from the presence table (or no table was given).
    pub strains: Option<BTreeSet<String>>,
    pub raw: DimensionMap<Option<f64>>,
}

impl MetaboliteRecord {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            formula: None,
            strains: None,
            raw: DimensionMap::default(),
        }
    }

    /// Number of dimensions with a raw value.
    pub fn present_raw_count(&self) -> usize {
        self.raw.iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Loader output: records sorted by identifier.
#[derive(Debug, Clone)]
pub struct LoadedEvidence {
    pub records: Vec<MetaboliteRecord>,
    pub supplied: Vec<TableKind>,
    /// Number of metabolites present in every supplied table.
    pub common: usize,
}

struct PresenceRow {
    name: Option<String>,
    formula: Option<String>,
    strains: BTreeSet<String>,
}

/// Load and cross-validate all supplied tables.
pub fn load(tables: &EvidenceTables) -> Result<LoadedEvidence> {
    if tables.is_empty() {
        return Err(RankError::schema("evidence", "no evidence tables supplied"));
    }

    let mut dimension_values: Vec<(EvidenceDimension, BTreeMap<String, Option<f64>>)> = Vec::new();
    let mut presence: Option<BTreeMap<String, PresenceRow>> = None;
    let mut key_sets: Vec<BTreeSet<String>> = Vec::new();
    let mut supplied = Vec::new();

    for (kind, table) in tables.supplied() {
        supplied.push(kind);
        table.check_shape(kind.name())?;
        match kind.dimension() {
            Some(dimension) => {
                let values = load_dimension_table(kind, dimension, table)?;
                key_sets.push(values.keys().cloned().collect());
                dimension_values.push((dimension, values));
            }
            None => {
                let rows = load_presence_table(table)?;
                key_sets.push(rows.keys().cloned().collect());
                presence = Some(rows);
            }
        }
        tracing::debug!(table = kind.name(), rows = table.len(), "evidence table validated");
    }

    let common = intersect(&key_sets);
    if common.is_empty() {
        return Err(RankError::IdentifierMismatch {
            tables: supplied.iter().map(|k| k.name().to_string()).collect(),
        });
    }

    let mut records: BTreeMap<String, MetaboliteRecord> = BTreeMap::new();
    for keys in &key_sets {
        for id in keys {
            records
                .entry(id.clone())
                .or_insert_with(|| MetaboliteRecord::new(id));
        }
    }

    for (dimension, values) in dimension_values {
        for (id, value) in values {
            if let Some(record) = records.get_mut(&id) {
                record.raw.set(dimension, value);
            }
        }
    }

    if let Some(rows) = presence {
        for (id, row) in rows {
            if let Some(record) = records.get_mut(&id) {
                if let Some(name) = row.name {
                    record.name = name;
                }
                record.formula = row.formula;
                record.strains = Some(row.strains);
            }
        }
    }

    tracing::info!(
        tables = supplied.len(),
        metabolites = records.len(),
        common = common.len(),
        "evidence tables loaded"
    );

    Ok(LoadedEvidence {
        records: records.into_values().collect(),
        supplied,
        common: common.len(),
    })
}

/// Read `{metabolite_id, <dimension>_raw}` into id → value.
fn load_dimension_table(
    kind: TableKind,
    dimension: EvidenceDimension,
    table: &EvidenceTable,
) -> Result<BTreeMap<String, Option<f64>>> {
    let id_col = table.require_column(kind.name(), METABOLITE_ID)?;
    let value_col = table.require_column(kind.name(), dimension.raw_column())?;

    let mut values = BTreeMap::new();
    for row in 0..table.len() {
        let id = read_id(kind, table, row, id_col)?;
        let cell = table.cell(row, value_col);
        let value = parse_value(cell).map_err(|value| RankError::InvalidValue {
            table: kind.name().to_string(),
            row: row + 1,
            column: dimension.raw_column().to_string(),
            value,
        })?;
        if values.insert(id.clone(), value).is_some() {
            return Err(duplicate(kind, &id));
        }
    }
    Ok(values)
}

fn load_presence_table(table: &EvidenceTable) -> Result<BTreeMap<String, PresenceRow>> {
    let kind = TableKind::Presence;
    let id_col = table.require_column(kind.name(), METABOLITE_ID)?;
    let name_col = NAME_COLUMNS.iter().find_map(|c| table.column(c));
    let formula_col = table.column(FORMULA_COLUMN);

    let strain_cols: Vec<(usize, &str)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_col && Some(*i) != name_col && Some(*i) != formula_col)
        .map(|(i, h)| (i, h.trim()))
        .collect();

    let mut rows = BTreeMap::new();
    for row in 0..table.len() {
        let id = read_id(kind, table, row, id_col)?;
        let mut strains = BTreeSet::new();
        for &(col, strain) in &strain_cols {
            let present = parse_value(table.cell(row, col)).map_err(|value| RankError::InvalidValue {
                table: kind.name().to_string(),
                row: row + 1,
                column: strain.to_string(),
                value,
            })?;
            if present.is_some_and(|v| v > 0.0) {
                strains.insert(strain.to_string());
            }
        }
        let text = |col: Option<usize>| {
            col.map(|c| table.cell(row, c))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let entry = PresenceRow {
            name: text(name_col),
            formula: text(formula_col),
            strains,
        };
        if rows.insert(id.clone(), entry).is_some() {
            return Err(duplicate(kind, &id));
        }
    }
    Ok(rows)
}

fn read_id(kind: TableKind, table: &EvidenceTable, row: usize, id_col: usize) -> Result<String> {
    let id = table.cell(row, id_col);
    if id.is_empty() {
        return Err(RankError::schema(
            kind.name(),
            format!("row {} has an empty {METABOLITE_ID}", row + 1),
        ));
    }
    Ok(id.to_string())
}

fn duplicate(kind: TableKind, id: &str) -> RankError {
    RankError::schema(kind.name(), format!("duplicate {METABOLITE_ID} '{id}'"))
}

fn intersect(sets: &[BTreeSet<String>]) -> BTreeSet<String> {
    let mut iter = sets.iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };
    iter.fold(first.clone(), |acc, set| acc.intersection(set).cloned().collect())
}
