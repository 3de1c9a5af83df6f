//! Metabolyx — metabolite evidence integration and ranking.
//! Entry point for the `metabolyx` binary.

use clap::Parser;
use metabolyx_cli::commands::{run_config, run_rank};
use metabolyx_cli::{Cli, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("metabolyx=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Rank(args) => {
            info!("Version: {}", env!("CARGO_PKG_VERSION"));
            let run = run_rank(&args)?;
            info!(
                ranked = run.output.ranked.len(),
                excluded = run.output.excluded.len(),
                "ranking written to {}",
                args.out_dir.display()
            );

            println!("{:>4}  {:<24} {:>9}  dims", "rank", "metabolite", "score");
            for record in run.output.ranked.top(10) {
                println!(
                    "{:>4}  {:<24} {:>9.4}  {}",
                    record.rank, record.name, record.composite_score, record.present_dimensions
                );
            }
            if !run.output.excluded.is_empty() {
                println!("{} metabolite(s) excluded, see {}", run.output.excluded.len(), run.report.excluded.display());
            }
        }

        Command::Config(args) => {
            print!("{}", run_config(&args)?);
        }
    }

    Ok(())
}
