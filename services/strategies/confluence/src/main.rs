//! Confluence Signal Engine entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use confluence_bybit_adapter::{discover_symbols, BybitWebSocketClient};
use confluence_strategy::{ConfluenceStrategy, EngineConfig, PaperExecutor, TelegramNotifier};
use confluence_strategy_shared::{
    init_strategy_logging_with_level, load_config_file, resolve_config_path, Strategy,
};

/// Queue depth between the adapter and the strategy. Sized for a burst of
/// simultaneous candle closes across the whole symbol universe.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-indicator confluence signal engine", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force paper execution regardless of config
    #[arg(long)]
    dry_run: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_strategy_logging_with_level("confluence_strategy", &args.log_level)?;

    let mut config = load_config(&args).context("Failed to load engine configuration")?;
    apply_env_overrides(&mut config);
    if args.dry_run {
        config.execution.dry_run = true;
    }

    if !config.execution.dry_run {
        // Only the paper execution seam ships in this build.
        warn!("Live execution requested but no live client is wired, forcing dry-run");
        config.execution.dry_run = true;
    }

    if config.risk.max_capital_per_trade_pct > 10.0 {
        warn!(
            "max_capital_per_trade_pct {}% is aggressive for leveraged perpetuals",
            config.risk.max_capital_per_trade_pct
        );
    }

    resolve_symbol_universe(&mut config).await;
    log_startup_banner(&config);

    // Engine settings are the source of truth for universe and interval.
    let mut adapter_config = config.bybit.clone();
    adapter_config.symbols = config.engine.symbols.clone();
    adapter_config.interval = config.engine.interval.clone();

    let initial_balance = Decimal::from_f64(config.execution.initial_balance)
        .context("initial_balance is not representable as a decimal")?;
    let executor = Arc::new(PaperExecutor::new(initial_balance));
    let notifier = Arc::new(TelegramNotifier::new(config.telegram.clone()));

    notifier
        .notify_startup(
            "DRY-RUN",
            &config.engine.symbols,
            config.execution.initial_balance,
        )
        .await;

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let mut adapter = BybitWebSocketClient::new(adapter_config, events_tx)
        .context("Failed to initialize Bybit adapter")?;
    let mut strategy = ConfluenceStrategy::new(config, events_rx, executor, notifier)
        .context("Failed to initialize confluence strategy")?;
    let shutdown = strategy.shutdown_handle();

    let adapter_handle = tokio::spawn(async move {
        if let Err(e) = adapter.run().await {
            error!("Bybit adapter terminated: {:?}", e);
        }
    });

    let strategy_handle = tokio::spawn(async move {
        if let Err(e) = strategy.start().await {
            error!("Strategy failed: {:?}", e);
        }
    });

    info!("Confluence engine running. Press Ctrl+C to stop.");

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down confluence engine");
    shutdown.notify_one();

    // The strategy drains its queue and reports final stats; the adapter
    // notices the closed channel on its next emit, so cut it loose once the
    // strategy is done.
    let _ = strategy_handle.await;
    adapter_handle.abort();

    Ok(())
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let path = match &args.config {
        Some(path) => path.display().to_string(),
        None => resolve_config_path("CONFLUENCE_CONFIG_PATH", "configs/confluence.toml"),
    };

    load_config_file(&path, EngineConfig::default())
}

/// Environment beats the config file for secrets and the dry-run flag.
fn apply_env_overrides(config: &mut EngineConfig) {
    if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
        if !token.is_empty() {
            config.telegram.bot_token = token;
            config.telegram.enabled = true;
        }
    }

    if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
        if !chat_id.is_empty() {
            config.telegram.chat_id = chat_id;
        }
    }

    if let Ok(value) = std::env::var("DRY_RUN") {
        config.execution.dry_run = value.to_lowercase() == "true";
    }
}

/// Fill the symbol universe: discover liquid USDT perpetuals when the
/// configured list is empty, normalize and cap it otherwise.
async fn resolve_symbol_universe(config: &mut EngineConfig) {
    if config.engine.symbols.is_empty() {
        let mut discovered = discover_symbols(&config.bybit.rest_url).await;
        discovered.truncate(config.engine.max_symbols);
        config.engine.symbols = discovered;
    } else {
        config.engine.symbols = config
            .engine
            .symbols
            .iter()
            .map(|s| s.to_uppercase())
            .collect();
        config.engine.symbols.truncate(config.engine.max_symbols);
    }
}

fn log_startup_banner(config: &EngineConfig) {
    let divider = "=".repeat(60);
    info!("{}", divider);
    info!(
        "Confluence Signal Engine v{} - Starting",
        env!("CARGO_PKG_VERSION")
    );
    info!("{}", divider);
    info!("Mode: DRY-RUN");
    info!("Symbols: {} pairs", config.engine.symbols.len());
    info!("Timeframe: {}m", config.engine.interval);
    info!("Margin %: {}%", config.risk.max_capital_per_trade_pct);
    info!("Leverage: {}x", config.risk.leverage);
    info!("Min Order Value: ${}", config.risk.min_order_value);
    info!("Min confluence: {}%", config.engine.min_confluence_score);
    info!(
        "Min indicators: {}/5",
        config.engine.min_indicators_aligned
    );
    info!(
        "Telegram: {}",
        if config.telegram.is_configured() {
            "Enabled ✅"
        } else {
            "Disabled"
        }
    );
    info!("{}", divider);
}
