use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{debug, error, info};

use common::models::TradeDecision;
use common::{AppConfig, ExecutionMode, logger};
use executor::services::{
    ExecutionGateway, LiveExecutor, OrderExecutor, SimulatedExecutor, account_summary,
};
use executor::{AutoExecutePolicy, AutoOutcome, EXECUTION_WINDOW, TradingSession};
use market_data::BrokerApi;
use market_data::remote::{DhanClient, HttpHistoryClient};
use market_data::services::DataIngestion;
use storage::{BarStore, MarketDataStore};
use strategy::services::watchlist_performance;
use strategy::{ChatCompletionsClient, SignalGenerator, SignalSettings};

#[derive(Parser, Debug)]
#[command(name = "signal-desk")]
#[command(about = "LLM-assisted trade signals for an NSE watchlist")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch daily bars and store the missing ones
    Ingest {
        /// Symbols to refresh (defaults to the watchlist)
        symbols: Vec<String>,
    },

    /// Generate a trade decision for one symbol
    Signal {
        symbol: String,

        /// Execute the decision right away
        #[arg(long)]
        execute: bool,
    },

    /// Generate and auto-execute decisions for the whole watchlist
    Auto,

    /// Week change of every watchlist symbol
    Performance,

    /// Funds, positions and holdings
    Account,

    /// Credentials and configured modes
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();
    debug!("System starting up...");

    let args = Args::parse();
    let config = AppConfig::from_env()?;

    match args.command {
        Commands::Status => status(&config),
        Commands::Ingest { symbols } => ingest(&config, symbols).await?,
        Commands::Performance => performance(&config).await?,
        Commands::Account => account(&config).await?,
        Commands::Signal { symbol, execute } => signal(&config, &symbol.to_uppercase(), execute).await?,
        Commands::Auto => auto(&config).await?,
    }
    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<MarketDataStore>> {
    let store = MarketDataStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Database connection failed ({})", config.database_url))?;
    Ok(Arc::new(store))
}

fn broker(config: &AppConfig) -> anyhow::Result<Arc<dyn BrokerApi>> {
    let credentials = config.require_broker()?;
    let client = DhanClient::new(
        &config.broker_base_url,
        credentials,
        &config.exchange,
        config.http_timeout,
    )?;
    Ok(Arc::new(client))
}

async fn trading_session(config: &AppConfig) -> anyhow::Result<TradingSession> {
    let api_key = config.require_inference()?;
    let store = open_store(config).await?;

    let inference = ChatCompletionsClient::new(&config.inference_base_url, api_key, config.inference_timeout)?
        .with_json_mode(config.inference_json_mode);
    let signals = SignalGenerator::new(
        store,
        Arc::new(inference),
        SignalSettings {
            model: config.inference_model.clone(),
            ..SignalSettings::default()
        },
    );

    let executor: Arc<dyn OrderExecutor> = match config.execution_mode {
        ExecutionMode::Simulated => Arc::new(SimulatedExecutor),
        ExecutionMode::Live => Arc::new(LiveExecutor::new(broker(config)?)),
    };
    let gateway = ExecutionGateway::new(executor, config.security_ids.clone());
    let policy = AutoExecutePolicy::new(config.auto_execute, config.risk_limits);

    info!(
        "Session ready: {} execution, auto-execute {}",
        gateway.mode(),
        if policy.enabled { "enabled" } else { "disabled" }
    );
    Ok(TradingSession::new(signals, gateway, policy))
}

fn status(config: &AppConfig) {
    let missing = config.missing_credentials();
    if missing.is_empty() {
        println!("APIs configured");
    } else {
        println!("Missing API keys: {}", missing.join(", "));
    }
    println!("Execution mode: {}", config.execution_mode);
    println!(
        "Auto-execute: {} (min confidence {}, max risk {}, max {} trades)",
        if config.auto_execute { "enabled" } else { "disabled" },
        config.risk_limits.min_confidence,
        config.risk_limits.max_risk_score,
        config.risk_limits.max_daily_trades
    );
    println!("Watchlist: {}", config.watchlist.join(", "));
}

async fn ingest(config: &AppConfig, symbols: Vec<String>) -> anyhow::Result<()> {
    let symbols = if symbols.is_empty() {
        config.watchlist.clone()
    } else {
        symbols.into_iter().map(|s| s.to_uppercase()).collect()
    };

    let store: Arc<dyn BarStore> = open_store(config).await?;
    let source = HttpHistoryClient::new(&config.market_data_url, config.http_timeout)?;
    let ingestion = DataIngestion::new(Arc::new(source), store, &config.exchange);

    let report = ingestion.ingest(&symbols).await?;
    println!("{}", report.message());
    Ok(())
}

async fn performance(config: &AppConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let rows = watchlist_performance(store.as_ref(), &config.watchlist).await;

    if rows.is_empty() {
        println!("No performance data available");
        return Ok(());
    }
    println!("{:<10} {:>14} {:>12} {:>14}", "Symbol", "Current Price", "Week Change", "Last Updated");
    for row in rows {
        println!(
            "{:<10} {:>14} {:>11.2}% {:>14}",
            row.symbol,
            format!("₹{:.2}", row.latest_close),
            row.change_pct,
            row.last_updated.format("%d-%m-%Y")
        );
    }
    Ok(())
}

async fn account(config: &AppConfig) -> anyhow::Result<()> {
    let broker = broker(config)?;
    let summary = account_summary(broker.as_ref()).await?;

    println!("Available balance: ₹{:.2}", summary.funds.available_balance);
    println!("Utilized amount:   ₹{:.2}", summary.funds.utilized_amount);
    println!("Open positions:    {}", summary.positions.len());
    for position in &summary.positions {
        println!(
            "  {:<10} {:>6} @ ₹{:.2} ({})",
            position.trading_symbol, position.net_qty, position.buy_avg, position.product_type
        );
    }
    println!("Holdings:          {}", summary.holdings.len());
    for holding in &summary.holdings {
        println!(
            "  {:<10} {:>6} avg ₹{:.2} ltp ₹{:.2}",
            holding.trading_symbol, holding.quantity, holding.buy_avg, holding.ltp
        );
    }
    println!("Total investment:  ₹{:.2}", summary.total_investment);
    println!("Current value:     ₹{:.2}", summary.current_value);
    println!("Profit/Loss:       ₹{:.2}", summary.profit_loss);
    Ok(())
}

async fn signal(config: &AppConfig, symbol: &str, execute: bool) -> anyhow::Result<()> {
    let mut session = trading_session(config).await?;
    let decision = session.generate_signal(symbol).await?;
    print_decision(&decision);

    if execute {
        let latest = session.history().selectable().len().saturating_sub(1);
        match session.execute_selected(latest).await {
            Ok(report) => println!("{}", report.message),
            Err(e) => error!("Trade Execution Failed: {}", e),
        }
    }

    print_history(&session);
    Ok(())
}

async fn auto(config: &AppConfig) -> anyhow::Result<()> {
    let mut session = trading_session(config).await?;
    let report = session.run_auto(&config.watchlist).await?;

    for outcome in &report.outcomes {
        match outcome {
            AutoOutcome::Executed { symbol, message } => println!("{}: Trade Executed: {}", symbol, message),
            AutoOutcome::Held { symbol } => println!("{}: HOLD", symbol),
            AutoOutcome::Skipped { symbol, reason } => println!("{}: skipped ({})", symbol, reason),
            AutoOutcome::Failed { symbol, error } => println!("{}: {}", symbol, error),
        }
    }

    print_history(&session);
    Ok(())
}

fn print_decision(decision: &TradeDecision) {
    println!("{} {} ({})", decision.action, decision.stock, decision.order_type);
    println!("  Entry:       ₹{:.2}", decision.entry_price);
    println!("  Stop loss:   ₹{:.2}", decision.stop_loss);
    println!("  Take profit: ₹{:.2}", decision.take_profit);
    println!("  Confidence:  {}/10", decision.confidence);
    println!("  Risk score:  {}/10", decision.risk_score);
    if !decision.reasoning.is_empty() {
        println!("  {}", decision.reasoning);
    }
}

fn print_history(session: &TradingSession) {
    let recent = session.history().recent(EXECUTION_WINDOW);
    if recent.is_empty() {
        println!("No recent trade signals");
        return;
    }
    println!("Recent trade signals:");
    for (i, decision) in recent.iter().enumerate() {
        let status = match &decision.execution_status {
            Some(status) => status.to_string(),
            None => "-".to_string(),
        };
        println!("  [{}] {} {}", i, decision.label(), status);
    }
}
