//! Subcommand implementations.

use anyhow::Context;
use metabolyx_common::{OutputFormat, RankingConfig};
use metabolyx_ranker::derivation::{significant_genes, specificity_table, target_impact_table};
use metabolyx_ranker::provider::{collect_tables, EvidenceProvider};
use metabolyx_ranker::{EvidenceTables, RankingEngine, RankingOutput, RankingPolicy, TableKind};
use std::path::Path;

use crate::cli::{ConfigArgs, RankArgs};
use crate::report::{write_report, WrittenReport};
use crate::tables::{read_table, CsvTableProvider};

/// Outcome of `metabolyx rank`.
#[derive(Debug)]
pub struct RankRun {
    pub output: RankingOutput,
    pub report: WrittenReport,
    pub format: OutputFormat,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<RankingConfig> {
    let config = RankingConfig::load(path).with_context(|| match path {
        Some(p) => format!("loading configuration from {}", p.display()),
        None => "loading configuration".to_string(),
    })?;
    Ok(config)
}

/// Assemble the engine input from the files named on the command line,
/// deriving specificity and target impact from upstream tables where asked.
pub fn gather_tables(args: &RankArgs, config: &RankingConfig) -> anyhow::Result<EvidenceTables> {
    let file_backed: Vec<CsvTableProvider> = [
        (TableKind::Specificity, &args.specificity),
        (TableKind::Presence, &args.presence),
        (TableKind::TargetImpact, &args.targets),
        (TableKind::MlScore, &args.ml),
    ]
    .into_iter()
    .filter_map(|(kind, path)| path.as_ref().map(|p| CsvTableProvider::new(kind, p)))
    .collect();

    let providers: Vec<&dyn EvidenceProvider> = file_backed.iter().map(|p| p as &dyn EvidenceProvider).collect();
    let mut tables = collect_tables(&providers)?;

    if let (Some(interactions), Some(signature)) = (&args.interactions, &args.signature) {
        let dge = read_table(signature)?;
        let significant = significant_genes(&dge, config.signature.padj_threshold)?;
        let interactions = read_table(interactions)?;
        let derived = target_impact_table(&interactions, &significant, config.signature.target_aggregation)?;
        // An empty table shares no identifier with the others: leave the
        // dimension unsupplied and let the normaliser report it
        if derived.is_empty() {
            tracing::warn!(
                significant = significant.len(),
                "no interaction reaches a significant gene; target impact left unsupplied"
            );
        } else {
            tables.set(TableKind::TargetImpact, derived);
        }
    }

    if tables.specificity.is_none() {
        if let Some(presence) = &tables.presence {
            tracing::info!("deriving pathogen specificity from the presence table");
            let derived = specificity_table(presence, &config.strains)?;
            tables.set(TableKind::Specificity, derived);
        }
    }

    Ok(tables)
}

pub fn run_rank(args: &RankArgs) -> anyhow::Result<RankRun> {
    let config = load_config(args.config.as_deref())?;
    let format = args.format.map(OutputFormat::from).unwrap_or(config.output.format);

    let tables = gather_tables(args, &config)?;
    let engine = RankingEngine::new(RankingPolicy::from_config(&config)?)?;
    let output = engine.rank(&tables)?;

    for warning in &output.warnings {
        tracing::warn!("{warning}");
    }

    let report = write_report(
        &output,
        &args.out_dir,
        format,
        config.output.top_n,
        config.output.include_normalised,
    )?;

    Ok(RankRun { output, report, format })
}

/// YAML text of the default or resolved configuration.
pub fn run_config(args: &ConfigArgs) -> anyhow::Result<String> {
    let config = if args.print_default {
        RankingConfig::default()
    } else {
        load_config(args.config.as_deref())?
    };
    Ok(config.to_yaml_string()?)
}
