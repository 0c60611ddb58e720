use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use eod_viewer::{
    config::{ViewerConfig, load_config_path},
    controller::{Applied, Controller},
    providers::build_provider,
    state::{FetchState, Phase},
    view::{Snapshot, render_pivot_csv, render_table},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "End-of-day stock price viewer")]
struct Cli {
    /// TOML config file; built-in defaults when omitted.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fetch one symbol list and print the result.
    Fetch {
        /// Comma-separated tickers, e.g. "AAPL, MSFT".
        #[arg(long)]
        symbols: String,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Read one submission per stdin line; newer lines supersede older ones.
    Session {
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Price table followed by the pivoted close matrix.
    Table,
    /// Full snapshot as JSON.
    Json,
    /// Pivoted close matrix as CSV.
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => ViewerConfig::default(),
    };
    let provider = build_provider(&cfg).context("failed to initialise provider")?;
    let mut controller = Controller::new(provider);
    let palette = &cfg.chart.palette;

    match cli.cmd {
        Cmd::Fetch { symbols, format } => {
            controller.submit(&symbols);
            controller.settle().await;
            print_state(controller.state(), palette, format)?;
        }
        Cmd::Session { format } => {
            run_session(&mut controller).await?;
            controller.settle().await;
            print_state(controller.state(), palette, format)?;
        }
    }

    if controller.state().phase() == Phase::Failed {
        bail!(
            "{}",
            controller.state().error_message().unwrap_or("request failed")
        );
    }
    Ok(())
}

async fn run_session(controller: &mut Controller) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("read stdin")? else {
                    return Ok(());
                };
                match controller.submit(&line) {
                    Some(token) => eprintln!("{token} loading {}", controller.state().query()),
                    None => eprintln!(
                        "rejected: {}",
                        controller.state().error_message().unwrap_or_default()
                    ),
                }
            }
            Some((token, applied)) = controller.next_completion() => {
                let state = controller.state();
                match applied {
                    Applied::Succeeded => {
                        eprintln!("{token} success: {} records", state.records().len())
                    }
                    Applied::Failed => eprintln!(
                        "{token} failed: {}",
                        state.error_message().unwrap_or_default()
                    ),
                    Applied::Stale => {}
                }
            }
        }
    }
}

fn print_state(state: &FetchState, palette: &[String], format: Format) -> Result<()> {
    let snapshot = Snapshot::capture(state, palette);
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        Format::Csv => print!("{}", render_pivot_csv(&snapshot.series, &snapshot.pivot)),
        Format::Table => {
            if let Some(message) = &snapshot.error_message {
                eprintln!("error: {message}");
            }
            if snapshot.records.is_empty() {
                println!("No data to display. Try searching for stock symbols.");
                return Ok(());
            }
            print!("{}", render_table(&snapshot.records));
            println!();
            print!("{}", render_pivot_csv(&snapshot.series, &snapshot.pivot));
        }
    }
    Ok(())
}
