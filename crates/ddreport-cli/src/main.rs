mod commands;
mod config;
mod palette;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use config::DdreportConfig;
use ddreport_core::{build_report, fetch_report, parse_document, PlayerReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ddreport")]
#[command(author, version, about = "DDNet player finish analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Print debug logs to stderr")]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Render the PNG report for a player")]
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(short, long, help = "Output file (default: report_<player>.png)")]
        output: Option<PathBuf>,
    },
    #[command(about = "Print monthly or daily totals")]
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, help = "Output the full report as JSON")]
        json: bool,
        #[arg(long, help = "Show days instead of months")]
        daily: bool,
    },
    #[command(about = "Export per-category totals as CSV")]
    Export {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, help = "Export months instead of days")]
        monthly: bool,
        #[arg(short, long, help = "Output file (default: stdout)")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
struct SourceArgs {
    #[arg(help = "DDNet player name")]
    player: String,

    #[arg(long, help = "Read the player document from a local JSON file")]
    input: Option<PathBuf>,

    #[arg(long, help = "Player API endpoint (default: https://ddnet.org/players/)")]
    api_url: Option<String>,

    #[arg(long, allow_hyphen_values = true, help = "Whole-hour UTC offset for day boundaries")]
    utc_offset: Option<i32>,

    #[arg(long, help = "Disable the loading spinner")]
    no_spinner: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli.command) {
        eprintln!("\n  {} {:#}\n", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<()> {
    let config = DdreportConfig::load();

    match command {
        Commands::Report { source, output } => {
            let report = load_report(&source, config)?;
            let path = commands::report::run(
                &report,
                commands::report::ReportImageOptions {
                    output,
                    font: config.font.clone(),
                    palette: config.palette(),
                },
            )?;
            println!("{}", format!("\n  ✓ Report saved to {}\n", path).green());
            Ok(())
        }
        Commands::Summary {
            source,
            json,
            daily,
        } => {
            let report = load_report(&source, config)?;
            commands::summary::run(&report, json, daily)
        }
        Commands::Export {
            source,
            monthly,
            output,
        } => {
            let report = load_report(&source, config)?;
            commands::export::run(&report, monthly, output.as_deref())
        }
    }
}

/// Build the report from `--input` when given, otherwise from the API.
fn load_report(source: &SourceArgs, config: &DdreportConfig) -> Result<PlayerReport> {
    let options = config.report_options(source.utc_offset)?;

    if let Some(path) = &source.input {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut document = parse_document(&json)
            .with_context(|| format!("Invalid player document in {}", path.display()))?;
        if document.player.is_empty() {
            document.player = source.player.clone();
        }
        return build_report(&document, &options)
            .with_context(|| format!("Failed to build report for {}", document.player));
    }

    let fetch = config.fetch_options(source.api_url.as_deref());
    let spinner = if source.no_spinner {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner());
        pb.set_message(format!("Fetching {}...", source.player));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    };

    let rt = Runtime::new()?;
    let result = rt.block_on(fetch_report(&source.player, &fetch, &options));

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result.with_context(|| format!("Failed to load report for {}", source.player))
}
