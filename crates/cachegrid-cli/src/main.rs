//! cachegrid — assign videos to cache servers.
//!
//! # Usage
//!
//! ```text
//! cachegrid solve kittens.in me_at_the_zoo.in --out-dir out
//! cachegrid score --input kittens.in --solution out/kittens.in.out
//! cachegrid inspect kittens.in --format json
//! ```

use std::path::PathBuf;

use cachegrid_core::CacheGridConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Format;

#[derive(Parser)]
#[command(
    name = "cachegrid",
    about = "cachegrid — latency-driven video placement for cache servers",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Config file (default: ./cachegrid.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a placement for each input file and write it next to it.
    ///
    /// Inputs come from the command line, or from [run].inputs in the
    /// config file. Ctrl-C stops after the current server; the partial
    /// placement is still written.
    Solve {
        /// Problem input files
        inputs: Vec<PathBuf>,
        /// Directory for output files (default: beside each input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Suffix appended to the input file name (default: .out)
        #[arg(long)]
        suffix: Option<String>,
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Validate and score an existing solution file
    Score {
        /// Problem input file
        #[arg(short, long)]
        input: PathBuf,
        /// Solution file in output format
        #[arg(short, long)]
        solution: PathBuf,
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Print a summary of a problem input
    Inspect {
        input: PathBuf,
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CacheGridConfig::discover(cli.config.as_deref(), &std::env::current_dir()?)?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log.filter.as_deref().unwrap_or("info"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Solve {
            inputs,
            out_dir,
            suffix,
            format,
        } => {
            let mut config = config;
            if out_dir.is_some() {
                config.run.output_dir = out_dir;
            }
            if suffix.is_some() {
                config.run.output_suffix = suffix;
            }
            commands::solve::solve(&config, inputs, format).await
        }
        Commands::Score {
            input,
            solution,
            format,
        } => commands::score::score(&input, &solution, format),
        Commands::Inspect { input, format } => commands::inspect::inspect(&input, format),
    }
}
