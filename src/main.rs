//! Signal Trader - Main Entry Point
//!
//! Replays a JSON-lines file of indicator snapshots through the decision
//! engine against a fixed price map. Approved orders are printed to stdout
//! as JSON lines; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signal_trader::common::channels::{create_audit_channel, create_order_channel};
use signal_trader::config::load_config;
use signal_trader::engine::default_worker_threads;
use signal_trader::{
    DispatcherConfig, PriceBook, ReplaySource, SharedPortfolio, SignalDispatcher, SignalEvent,
    TradeDecisionEngine,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "SIGNAL_TRADER_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// JSON object of symbol -> current price
    #[arg(long)]
    prices: String,

    /// JSON-lines file of signal events
    #[arg(long)]
    signals: String,

    /// Write every decision record as JSON lines to this file
    #[arg(long)]
    audit: Option<String>,

    /// Override the configured starting capital
    #[arg(long)]
    capital: Option<Decimal>,
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))
    }
}

fn read_prices(path: &str) -> Result<HashMap<String, Decimal>> {
    let file = File::open(path).with_context(|| format!("opening price file {}", path))?;
    let prices = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing price file {}", path))?;
    Ok(prices)
}

fn read_signals(path: &str) -> Result<Vec<SignalEvent>> {
    let file = File::open(path).with_context(|| format!("opening signal file {}", path))?;
    let mut events = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: SignalEvent = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid signal event", path, line_no + 1))?;
        events.push(event);
    }
    Ok(events)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.log_json)?;

    info!("Starting Signal Trader");
    info!("Configuration file: {}", args.config);

    let mut config = load_config(Some(&args.config))?;
    if let Some(capital) = args.capital {
        config.portfolio.initial_capital = capital;
    }

    let prices = Arc::new(PriceBook::from_map(read_prices(&args.prices)?));
    let events = read_signals(&args.signals)?;
    info!(events = events.len(), symbols = prices.len(), "Inputs loaded");

    let portfolio = SharedPortfolio::with_capital(config.portfolio.initial_capital);
    let (order_tx, mut order_rx) = create_order_channel(config.engine.channel_size);
    let (audit_tx, mut audit_rx) = create_audit_channel(config.engine.channel_size);

    let engine = Arc::new(TradeDecisionEngine::from_config(
        &config,
        portfolio.clone(),
        order_tx,
    )?);

    let dispatcher = SignalDispatcher::new(
        engine,
        prices,
        DispatcherConfig {
            worker_threads: config
                .engine
                .worker_threads
                .unwrap_or_else(default_worker_threads),
            lane_capacity: config.engine.lane_capacity,
            supersede_stale: config.engine.supersede_stale,
        },
    )
    .with_audit(audit_tx);

    let printer = tokio::spawn(async move {
        let mut out = std::io::stdout();
        let mut printed = 0u64;
        while let Some(order) = order_rx.recv().await {
            match serde_json::to_string(&order) {
                Ok(line) => {
                    if writeln!(out, "{}", line).is_err() {
                        break;
                    }
                    printed += 1;
                }
                Err(e) => warn!(error = %e, "Failed to serialize order"),
            }
        }
        printed
    });

    let audit_path = args.audit.clone();
    let auditor = tokio::spawn(async move {
        let mut writer = match audit_path.as_deref().map(File::create).transpose() {
            Ok(file) => file.map(BufWriter::new),
            Err(e) => {
                warn!(error = %e, "Cannot open audit file, records will be discarded");
                None
            }
        };
        while let Some(record) = audit_rx.recv().await {
            if let Some(w) = writer.as_mut() {
                let written = serde_json::to_string(&record)
                    .map_err(std::io::Error::from)
                    .and_then(|line| writeln!(w, "{}", line));
                if let Err(e) = written {
                    warn!(error = %e, "Failed to write decision record");
                }
            }
        }
        if let Some(mut w) = writer {
            if let Err(e) = w.flush() {
                warn!(error = %e, "Failed to flush audit file");
            }
        }
    });

    let summary = dispatcher.run(ReplaySource::new(events)).await?;

    // Dropping the dispatcher releases the last engine handle, closing both channels
    drop(dispatcher);
    let printed = printer.await?;
    auditor.await?;

    let state = portfolio.snapshot().await;
    info!(
        processed = summary.processed,
        approved = summary.approved,
        rejected = summary.rejected,
        faulted = summary.faulted,
        superseded = summary.superseded,
        orders = printed,
        open_positions = state.total_open_positions(),
        cash_available = %state.cash_available,
        "Run complete"
    );

    Ok(())
}
