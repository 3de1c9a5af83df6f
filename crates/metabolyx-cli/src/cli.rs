use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use metabolyx_common::OutputFormat;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "metabolyx")]
#[command(version)]
#[command(about = "Rank bacterial metabolites by integrated host-activation evidence", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Integrate evidence tables and write the composite ranking
    Rank(RankArgs),

    /// Show the ranking configuration
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Default, Args)]
#[command(group(
    ArgGroup::new("inputs")
        .required(true)
        .multiple(true)
        .args(["specificity", "presence", "targets", "interactions", "ml"])
))]
pub struct RankArgs {
    /// Pathogen specificity table {metabolite_id, pathogen_specificity_raw}
    #[arg(long)]
    pub specificity: Option<PathBuf>,

    /// Metabolite presence by strain {metabolite_id, [name], [formula], <strain>...}
    #[arg(long)]
    pub presence: Option<PathBuf>,

    /// Target impact table {metabolite_id, target_impact_raw}
    #[arg(long, conflicts_with = "interactions")]
    pub targets: Option<PathBuf>,

    /// Predicted interactions {metabolite_id, target_gene, [confidence]}
    #[arg(long, requires = "signature")]
    pub interactions: Option<PathBuf>,

    /// Differential expression results {gene, padj}
    #[arg(long, requires = "interactions")]
    pub signature: Option<PathBuf>,

    /// Bioactivity classifier scores {metabolite_id, ml_score_raw}
    #[arg(long)]
    pub ml: Option<PathBuf>,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "METABOLYX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the result tables
    #[arg(short, long, default_value = "metabolyx-results")]
    pub out_dir: PathBuf,

    /// Output format; overrides the configuration
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Print the built-in defaults instead of the resolved configuration
    #[arg(long)]
    pub print_default: bool,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "METABOLYX_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Tsv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Tsv => OutputFormat::Tsv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}
