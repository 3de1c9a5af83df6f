//! Delimited-file access to evidence tables.

use anyhow::Context;
use metabolyx_ranker::provider::EvidenceProvider;
use metabolyx_ranker::{EvidenceTable, TableKind};
use std::path::{Path, PathBuf};

/// Field delimiter for a table file: tab for `.tsv`/`.tab`, comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

/// Read a headed delimited file into a text table.
///
/// Ragged rows are passed through unchanged; the loader reports them with
/// the table name and row number.
pub fn read_table(path: &Path) -> anyhow::Result<EvidenceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter_for(path))
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = EvidenceTable::new(&headers);
    for result in reader.records() {
        let record = result.with_context(|| format!("reading {}", path.display()))?;
        table.push_row(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(path = %path.display(), rows = table.len(), "table read");
    Ok(table)
}

/// Evidence provider backed by a CSV/TSV export of an upstream stage.
#[derive(Debug, Clone)]
pub struct CsvTableProvider {
    kind: TableKind,
    path: PathBuf,
}

impl CsvTableProvider {
    pub fn new(kind: TableKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EvidenceProvider for CsvTableProvider {
    fn kind(&self) -> TableKind {
        self.kind
    }

    fn fetch(&self) -> anyhow::Result<EvidenceTable> {
        read_table(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_delimiter_from_extension() {
        assert_eq!(delimiter_for(Path::new("ml.tsv")), b'\t');
        assert_eq!(delimiter_for(Path::new("ml.TSV")), b'\t');
        assert_eq!(delimiter_for(Path::new("ml.csv")), b',');
        assert_eq!(delimiter_for(Path::new("ml")), b',');
    }

    #[test]
    fn test_read_tsv_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ml.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "metabolite_id\tml_score_raw").unwrap();
        writeln!(file, "ToxinA\t0.92").unwrap();
        writeln!(file, "Pyruvate\tNA").unwrap();
        drop(file);

        let table = CsvTableProvider::new(TableKind::MlScore, &path).fetch().unwrap();
        assert_eq!(table.headers, vec!["metabolite_id", "ml_score_raw"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 1), "NA");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_table(Path::new("/nonexistent/ml.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/ml.csv"));
    }
}
