use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use commands::compare::CompareArgs;
use config::{Config, OutputFormat};

#[derive(Parser)]
#[command(name = "genecmp")]
#[command(about = "GeneCmp - region-restricted genome comparison")]
#[command(version)]
#[command(long_about = "
GeneCmp compares two individuals' aligned reads over a set of named regions.
Ordinary regions are scored by edit distance; regions carrying a repeat motif
are treated as STR markers and compared by repeat count.

Examples:
  genecmp compare --first father.sam --second son.sam --regions genes.bed
  genecmp compare --first a.bam --second b.sam.gz --regions ystr.bed --json report.json
  genecmp config --example > genecmp.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two samples over the regions of a BED-like file
    Compare {
        /// First sample (SAM, gzipped SAM or BAM)
        #[arg(long, required = true)]
        first: PathBuf,

        /// Second sample (SAM, gzipped SAM or BAM)
        #[arg(long, required = true)]
        second: PathBuf,

        /// Regions of interest: chrom, start, end, gene and an optional repeat motif
        #[arg(long, required = true)]
        regions: PathBuf,

        /// Number of worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Print every region result, not only per-gene summaries
        #[arg(long)]
        verbose_intermediate: bool,

        /// Keep gapped alignments on edit-distance results
        #[arg(long)]
        traceback: bool,

        /// Split regions longer than this many bases (0 disables)
        #[arg(long)]
        max_region_len: Option<usize>,

        /// Output format on stdout
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Also write the full JSON report to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Print an example configuration file
        #[arg(long)]
        example: bool,
    },
}

fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level(verbose, quiet)))
        .format_timestamp_secs()
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compare {
            first,
            second,
            regions,
            threads,
            verbose_intermediate,
            traceback,
            max_region_len,
            format,
            json,
        } => {
            let args = CompareArgs {
                first,
                second,
                regions,
                threads,
                verbose_intermediate,
                traceback,
                max_region_len,
                format,
                json,
            };
            commands::compare::execute(&config, args)?;
        }

        Commands::Config { example } => {
            if example {
                print!("{}", Config::example_toml()?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli) {
        error::print_error_and_exit(&err);
    }
}
