mod briefing;
mod config;
mod digest;
mod error;
mod http_client;
mod market;
mod models;
mod notify;
mod pipeline;
mod storage;
mod trend;
mod utils;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::pipeline::{Pipeline, RunOptions};
use crate::storage::TrendRecordStore;
use crate::utils::{ellipsize, fmt_pct};

#[derive(Parser)]
#[command(name = "market-brief", about = "Daily market briefing: macro, sectors, community, AI summary", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch data, record sector trend, generate and send the briefing
    Run {
        /// Print the message instead of sending it
        #[arg(long)]
        no_send: bool,

        /// Do not append to the trend CSV
        #[arg(long)]
        no_persist: bool,
    },

    /// Fetch data and print the generation prompt (nothing stored or sent)
    Prompt,

    /// Summarise the sector trend CSV
    Trend {
        /// Trend file (default: storage.trend_path from config)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Only the most recent N run dates
        #[arg(short, long)]
        last: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "market_brief=info,warn",
        1 => "market_brief=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Run { no_send, no_persist } => {
            let _t = utils::Timer::start("Daily briefing");
            let today = Local::now().date_naive();
            let opts = RunOptions {
                persist: !no_persist,
                send: !no_send,
            };
            let stats = Pipeline::from_config(config)?.run(today, opts).await?;
            if let Some(err) = &stats.store_error {
                info!("Trend record was not updated: {}", err);
            }
        }

        Command::Prompt => {
            let pipeline = Pipeline::from_config(config)?;
            let gathered = pipeline.gather().await;
            println!("{}", pipeline.prompt(&gathered));
        }

        Command::Trend { file, last } => {
            let path = file.unwrap_or_else(|| config.storage.trend_path.clone());
            let rows = TrendRecordStore::new(&path)
                .read_all()
                .with_context(|| format!("Failed to read {:?}", path))?;
            let recent = trend::recent_rows(&rows, last);

            if recent.is_empty() {
                println!("No trend rows in {:?}; run `market-brief run` first.", path);
                return Ok(());
            }

            let summary = trend::summarise(&recent);
            println!("──────────────────────────────────────────────────────────────────────────");
            println!("  Sector trend: {} rows from {:?}", recent.len(), path);
            println!("──────────────────────────────────────────────────────────────────────────");
            println!("  {:<6} {:<20} {:>4} {:>9} {:>9} {:>20} {:>20}", "Ticker", "Sector", "Days", "Latest", "Mean", "Best", "Worst");
            for s in &summary {
                println!(
                    "  {:<6} {:<20} {:>4} {:>9} {:>9} {:>20} {:>20}",
                    s.ticker,
                    ellipsize(&s.sector, 20),
                    s.days,
                    fmt_pct(s.latest.1),
                    fmt_pct(s.mean),
                    format!("{} {}", fmt_pct(s.best.1), s.best.0),
                    format!("{} {}", fmt_pct(s.worst.1), s.worst.0),
                );
            }
            println!("──────────────────────────────────────────────────────────────────────────");
        }
    }

    Ok(())
}
