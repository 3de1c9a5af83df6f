//! Result table writers.
//!
//! Every table is written as one serde row type so CSV, TSV and JSON stay
//! column-for-column identical. Missing scores are empty cells in delimited
//! output and `null` in JSON.

use anyhow::Context;
use metabolyx_common::{EvidenceDimension, OutputFormat};
use metabolyx_ranker::normalise::NormalisedTable;
use metabolyx_ranker::{ExcludedMetabolite, RankedResult, RankingOutput};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow<'a> {
    pub rank: usize,
    pub metabolite_id: &'a str,
    pub name: &'a str,
    pub composite_score: f64,
    pub present_dimensions: usize,
    pub pathogen_specificity: Option<f64>,
    pub target_impact: Option<f64>,
    pub ml_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedRow<'a> {
    pub metabolite_id: &'a str,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalisedRow<'a> {
    pub metabolite_id: &'a str,
    pub dimension: &'static str,
    pub raw: Option<f64>,
    pub normalised: Option<f64>,
    pub method: &'static str,
}

pub fn ranking_rows(ranked: &RankedResult) -> Vec<RankingRow<'_>> {
    ranked
        .iter()
        .map(|r| RankingRow {
            rank: r.rank,
            metabolite_id: &r.metabolite_id,
            name: &r.name,
            composite_score: r.composite_score,
            present_dimensions: r.present_dimensions,
            pathogen_specificity: r.normalised[EvidenceDimension::PathogenSpecificity],
            target_impact: r.normalised[EvidenceDimension::TargetImpact],
            ml_score: r.normalised[EvidenceDimension::MlScore],
        })
        .collect()
}

pub fn excluded_rows(excluded: &[ExcludedMetabolite]) -> Vec<ExcludedRow<'_>> {
    excluded
        .iter()
        .map(|e| ExcludedRow {
            metabolite_id: &e.metabolite_id,
            reason: e.reason.as_str(),
        })
        .collect()
}

/// Long format: one row per metabolite and dimension.
pub fn normalised_rows(table: &NormalisedTable) -> Vec<NormalisedRow<'_>> {
    table
        .rows
        .iter()
        .flat_map(|row| {
            row.scores.iter().map(move |(dimension, score)| NormalisedRow {
                metabolite_id: &row.metabolite_id,
                dimension: dimension.label(),
                raw: score.raw,
                normalised: score.value,
                method: table.dimensions[dimension].method.name(),
            })
        })
        .collect()
}

/// Serialise rows to `path` in the requested format.
pub fn write_rows<T: Serialize>(path: &Path, format: OutputFormat, rows: &[T]) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), rows)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        OutputFormat::Csv | OutputFormat::Tsv => {
            let delimiter = if format == OutputFormat::Tsv { b'\t' } else { b',' };
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_path(path)
                .with_context(|| format!("creating {}", path.display()))?;
            for row in rows {
                writer.serialize(row).with_context(|| format!("writing {}", path.display()))?;
            }
            writer.flush().with_context(|| format!("flushing {}", path.display()))?;
        }
    }
    Ok(())
}

/// Files produced by one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrittenReport {
    pub ranking: PathBuf,
    pub excluded: PathBuf,
    pub normalised: Option<PathBuf>,
    pub radar_profiles: PathBuf,
}

/// Write all result tables for one ranking into `out_dir`.
pub fn write_report(
    output: &RankingOutput,
    out_dir: &Path,
    format: OutputFormat,
    top_n: usize,
    include_normalised: bool,
) -> anyhow::Result<WrittenReport> {
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let ext = format.extension();

    let ranking = out_dir.join(format!("ranking.{ext}"));
    write_rows(&ranking, format, &ranking_rows(&output.ranked))?;

    let excluded = out_dir.join(format!("excluded.{ext}"));
    write_excluded(&excluded, format, &output.excluded)?;

    let normalised = if include_normalised {
        let path = out_dir.join(format!("normalised.{ext}"));
        write_rows(&path, format, &normalised_rows(&output.normalised))?;
        Some(path)
    } else {
        None
    };

    let radar_profiles = out_dir.join("radar_profiles.json");
    write_rows(&radar_profiles, OutputFormat::Json, &output.ranked.radar_profiles(top_n))?;

    tracing::info!(dir = %out_dir.display(), format = ext, "report written");
    Ok(WrittenReport {
        ranking,
        excluded,
        normalised,
        radar_profiles,
    })
}

// csv writes no header for an empty slice of structs; the excluded table
// is often empty and still needs one.
fn write_excluded(path: &Path, format: OutputFormat, excluded: &[ExcludedMetabolite]) -> anyhow::Result<()> {
    if excluded.is_empty() && format != OutputFormat::Json {
        let delimiter = if format == OutputFormat::Tsv { b'\t' } else { b',' };
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        writer.write_record(["metabolite_id", "reason"])?;
        writer.flush()?;
        return Ok(());
    }
    write_rows(path, format, &excluded_rows(excluded))
}
