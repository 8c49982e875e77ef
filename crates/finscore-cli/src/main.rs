mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::AnalyzeArgs;
use commands::cash_flow::CashFlowArgs;
use commands::forecast::ForecastArgs;
use commands::ratios::RatiosArgs;
use commands::scoring::{AltmanArgs, FgpmiArgs};

/// Financial statement analysis, credit scoring and budget forecasting
#[derive(Parser)]
#[command(
    name = "finscore",
    version,
    about = "Financial statement analysis, credit scoring and budget forecasting",
    long_about = "A CLI for analysing civil-code balance sheets and income statements \
                  with decimal precision. Computes reclassified ratios, Altman Z-Scores, \
                  FGPMI ratings, indirect cash-flow statements and multi-year forecasts."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Scoring threshold file (YAML or JSON); the built-in tables otherwise
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the nine ratio groups for one snapshot
    Ratios(RatiosArgs),
    /// Altman Z-Score for one snapshot, or the trend over several
    Altman(AltmanArgs),
    /// FGPMI creditworthiness rating
    Fgpmi(FgpmiArgs),
    /// Indirect cash-flow statement from consecutive snapshots
    CashFlow(CashFlowArgs),
    /// Project a base year forward under per-year assumptions
    Forecast(ForecastArgs),
    /// Ratios, scores and cash flows for a company's whole history
    Analyze(AnalyzeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Ratios(args) => commands::ratios::run_ratios(args),
        Commands::Altman(args) => commands::scoring::run_altman(args, config),
        Commands::Fgpmi(args) => commands::scoring::run_fgpmi(args, config),
        Commands::CashFlow(args) => commands::cash_flow::run_cash_flow(args),
        Commands::Forecast(args) => commands::forecast::run_forecast(args),
        Commands::Analyze(args) => commands::analyze::run_analyze(args, config),
        Commands::Version => {
            println!("finscore {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
