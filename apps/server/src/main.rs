//! Spread Bot - Headless Server
//!
//! Compares OKX spot prices with Jupiter swap quotes for Solana tokens and
//! serves the results over a small REST API.

mod api;
mod config;
mod session;
mod state;

use clap::Parser;
use config::AppConfig;
use spread_core::ComparisonLog;
use spread_engine::{ComparatorConfig, ComparisonOrchestrator, MemoryLog, SpreadDirection};
use spread_feeds::{JupiterClient, OkxClient};
use spread_store::Database;
use state::{create_state, SharedState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Entries kept by the in-memory log in `--no-db` mode.
const MEMORY_LOG_CAPACITY: usize = 10_000;

/// Spread Bot CLI
#[derive(Parser, Debug)]
#[command(name = "spread-bot")]
#[command(about = "CEX/DEX price spread scanner", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,

    /// HTTP API port
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite URL for the comparison log (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Seconds between background scans
    #[arg(long)]
    scan_interval: Option<u64>,

    /// Keep the comparison log in memory instead of SQLite (newest 10000 entries only)
    #[arg(long, default_value_t = false)]
    no_db: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Apply CLI and environment overrides on top of the file config.
fn apply_overrides(config: &mut AppConfig, args: &Args, env_database_url: Option<String>) {
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url.clone().or(env_database_url) {
        config.database_url = url;
    }
    if let Some(secs) = args.scan_interval {
        config.scan_interval_secs = secs;
    }
}

async fn open_log(config: &AppConfig, no_db: bool) -> Result<Arc<dyn ComparisonLog>, String> {
    if no_db {
        info!("  Comparison log: in memory");
        return Ok(Arc::new(MemoryLog::bounded(MEMORY_LOG_CAPACITY)));
    }
    let db = Database::connect(&config.database_url)
        .await
        .map_err(|e| format!("failed to open {}: {}", config.database_url, e))?;
    info!("  Comparison log: {}", config.database_url);
    Ok(Arc::new(db))
}

fn build_orchestrator(
    config: &AppConfig,
    log: Arc<dyn ComparisonLog>,
) -> Result<ComparisonOrchestrator, String> {
    let comparator = ComparatorConfig::from(&config.comparator);
    let registry = config.registry();

    let okx = OkxClient::new(
        config.venues.okx_base_url.clone(),
        &registry.quote.symbol,
        comparator.cex_timeout,
    )
    .map_err(|e| e.to_string())?;
    let jupiter = JupiterClient::new(
        config.venues.jupiter_quote_url.clone(),
        config.venues.jupiter_tokens_url.clone(),
        comparator.dex_timeout,
    )
    .map_err(|e| e.to_string())?;

    Ok(ComparisonOrchestrator::new(
        comparator,
        registry,
        Arc::new(okx),
        Arc::new(jupiter),
        log,
    ))
}

async fn run_scanner(state: SharedState) {
    let interval = Duration::from_secs(state.config.scan_interval_secs.max(1));
    info!("Starting scanner (every {}s)", interval.as_secs());

    let symbols = state.orchestrator.registry().symbols();
    while state.is_running() {
        let top = state.orchestrator.compare_batch(&symbols).await;
        if top.is_empty() {
            info!("Scan complete: no valid spreads");
        }
        for (rank, result) in top.iter().enumerate() {
            let spread = result.spread_pct.unwrap_or_default();
            info!(
                rank = rank + 1,
                symbol = %result.symbol,
                spread,
                direction = ?SpreadDirection::from_spread(spread),
                cex = result.price_cex,
                dex = result.price_dex,
                "Top spread"
            );
        }

        tokio::time::sleep(interval).await;
    }

    info!("Scanner stopped");
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = match AppConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging(args.log_level.as_deref().unwrap_or("info"));
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    apply_overrides(&mut config, &args, std::env::var("DATABASE_URL").ok());

    init_logging(&config.log_level);

    info!("Spread Bot starting...");
    info!("  Config: {}", args.config);
    info!("  Tokens: {}", config.registry().symbols().join(", "));
    info!("  Max spread: {}%", config.comparator.max_spread_pct);
    info!("  Min volume: {} USDC", config.comparator.min_volume);
    info!("  API port: {}", config.server.port);

    let log = match open_log(&config, args.no_db).await {
        Ok(log) => log,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    let orchestrator = match build_orchestrator(&config, log) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("Failed to create venue clients: {}", e);
            return;
        }
    };

    let port = config.server.port;
    let state = create_state(config, orchestrator);
    state.start();

    let scanner_state = state.clone();
    let scanner_handle = tokio::spawn(async move {
        run_scanner(scanner_state).await;
    });

    info!("Press Ctrl+C to stop...");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        warn!("Shutdown signal received");
    };

    if let Err(e) = api::serve(state.clone(), port, shutdown).await {
        error!("API server error: {}", e);
    }

    state.stop();
    if tokio::time::timeout(Duration::from_secs(2), scanner_handle)
        .await
        .is_err()
    {
        warn!("Scanner did not stop in time");
    }

    let summary = state.orchestrator.stats();
    info!("Final Stats:");
    info!("  Uptime: {} seconds", state.uptime_secs());
    info!("  Comparisons: {}", summary.comparisons);
    info!("  Valid: {}", summary.valid);
    info!("  Rejected: {}", summary.rejected);
    info!("  Fetch failures: {}", summary.fetch_failures);
    info!("  Persistence failures: {}", summary.persistence_failures);
    if !state.sessions.is_empty() {
        info!("  Users: {}", state.sessions.len());
    }

    info!("Spread Bot stopped");
}
