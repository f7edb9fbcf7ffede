use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::models::{
    BarInsert, FundLimits, Holding, OrderConfirmation, OrderRequest, Position, TradeAction,
};
use common::RiskLimits;
use executor::services::{
    ExecutionGateway, HOLD_MESSAGE, LiveExecutor, OrderExecutor, SimulatedExecutor,
};
use executor::{AutoExecutePolicy, AutoOutcome, TradingSession};
use market_data::services::{DataIngestion, HISTORY_BARS};
use market_data::{BrokerApi, HistorySource, Interval};
use mockall::mock;
use storage::data_manager::window_start;
use storage::{BarStore, MarketDataStore};
use strategy::{ChatMessage, InferenceClient, SignalGenerator, SignalSettings};

mock! {
    pub History {}

    #[async_trait]
    impl HistorySource for History {
        async fn get_history(
            &self,
            symbol: &str,
            exchange: &str,
            interval: Interval,
            bar_count: u32,
        ) -> anyhow::Result<Vec<BarInsert>>;
    }
}

mock! {
    pub Inference {}

    #[async_trait]
    impl InferenceClient for Inference {
        async fn complete(&self, model: &str, messages: &[ChatMessage]) -> anyhow::Result<String>;
    }
}

mock! {
    pub Broker {}

    #[async_trait]
    impl BrokerApi for Broker {
        async fn place_order(&self, order: &OrderRequest) -> anyhow::Result<OrderConfirmation>;
        async fn get_funds(&self) -> anyhow::Result<FundLimits>;
        async fn get_positions(&self) -> anyhow::Result<Vec<Position>>;
        async fn get_holdings(&self) -> anyhow::Result<Vec<Holding>>;
    }
}

const WATCHLIST: [&str; 5] = ["TCS", "INFY", "RELIANCE", "HDFCBANK", "SBIN"];

fn watchlist() -> Vec<String> {
    WATCHLIST.iter().map(|s| s.to_string()).collect()
}

fn security_ids() -> BTreeMap<String, String> {
    [
        ("RELIANCE", "500325"),
        ("HDFCBANK", "1333"),
        ("INFY", "500209"),
        ("SBIN", "3045"),
        ("TCS", "11536"),
    ]
    .iter()
    .map(|(s, id)| (s.to_string(), id.to_string()))
    .collect()
}

/// Twenty daily bars ending yesterday, rising by one rupee a day.
fn daily_bars(symbol: &str) -> Vec<BarInsert> {
    let now = Utc::now();
    (1..=20)
        .rev()
        .map(|days_ago| BarInsert {
            symbol: symbol.to_string(),
            datetime: window_start(now, days_ago),
            open: 1000.0,
            high: 1010.0,
            low: 990.0,
            close: 1020.0 - days_ago as f64,
            volume: 50_000.0,
        })
        .collect()
}

/// Serves bars for every symbol except the ones in `empty`.
fn history(empty: &'static [&'static str]) -> MockHistory {
    let mut source = MockHistory::new();
    source
        .expect_get_history()
        .withf(|_, exchange, _, count| exchange == "NSE" && *count == HISTORY_BARS)
        .returning(move |symbol, _, _, _| {
            if empty.contains(&symbol) {
                Ok(Vec::new())
            } else {
                Ok(daily_bars(symbol))
            }
        });
    source
}

fn decision_reply(symbol: &str, action: &str) -> String {
    format!(
        "<think>checking the moving averages</think>\nSure! Here is the decision: \
         {{\"stock\":\"{}\",\"action\":\"{}\",\"reasoning\":\"steady uptrend\",\
         \"entry_price\":1019,\"stop_loss\":1000,\"take_profit\":1050,\
         \"order_type\":\"DELIVERY\",\"risk_score\":3,\"confidence\":8}} Thanks!",
        symbol, action
    )
}

/// HOLD for INFY, BUY for everything else.
fn inference() -> MockInference {
    let mut inference = MockInference::new();
    inference.expect_complete().returning(|_, messages| {
        let prompt = &messages[0].content;
        let symbol = WATCHLIST
            .iter()
            .find(|s| prompt.starts_with(&format!("Analyze the following stock: {}\n", s)))
            .ok_or_else(|| anyhow::anyhow!("unexpected prompt"))?;
        let action = if *symbol == "INFY" { "HOLD" } else { "BUY" };
        Ok(decision_reply(symbol, action))
    });
    inference
}

async fn ingested_store(empty: &'static [&'static str]) -> Arc<MarketDataStore> {
    let store = Arc::new(MarketDataStore::connect("sqlite::memory:").await.unwrap());
    DataIngestion::new(Arc::new(history(empty)), store.clone(), "NSE")
        .ingest(&watchlist())
        .await
        .unwrap();
    store
}

fn session(store: Arc<MarketDataStore>, executor: Arc<dyn OrderExecutor>, policy: AutoExecutePolicy) -> TradingSession {
    let signals = SignalGenerator::new(store, Arc::new(inference()), SignalSettings::default());
    TradingSession::new(signals, ExecutionGateway::new(executor, security_ids()), policy)
}

#[tokio::test]
async fn ingestion_is_idempotent_and_reports_partial_failure() {
    let store = Arc::new(MarketDataStore::connect("sqlite::memory:").await.unwrap());
    let ingestion = DataIngestion::new(
        Arc::new(history(&["RELIANCE", "HDFCBANK"])),
        store.clone(),
        "NSE",
    );

    let first = ingestion.ingest(&watchlist()).await.unwrap();
    let second = ingestion.ingest(&watchlist()).await.unwrap();

    assert_eq!(first.inserted_rows, 60);
    assert_eq!(second.inserted_rows, 0);
    assert_eq!(
        first.message(),
        "Partially successful: 3/5 stocks updated (TCS, INFY, SBIN). \
         Errors: No data found for RELIANCE, No data found for HDFCBANK"
    );
    for symbol in ["TCS", "INFY", "SBIN"] {
        assert_eq!(store.count(symbol).await.unwrap(), 20);
        assert_eq!(store.read(symbol, 30).await.unwrap().len(), 20);
    }
    assert_eq!(store.count("RELIANCE").await.unwrap(), 0);
}

#[tokio::test]
async fn symbol_without_bars_yields_no_decision() {
    let store = ingested_store(&["RELIANCE"]).await;
    let mut session = session(store, Arc::new(SimulatedExecutor), AutoExecutePolicy::default());

    let err = session.generate_signal("RELIANCE").await.unwrap_err();

    assert_eq!(err.to_string(), "Insufficient data for RELIANCE");
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn signal_then_simulated_execution_updates_ledger() {
    let store = ingested_store(&[]).await;
    let mut session = session(store, Arc::new(SimulatedExecutor), AutoExecutePolicy::default());

    let decision = session.generate_signal("TCS").await.unwrap();
    assert_eq!(decision.action, TradeAction::Buy);
    assert_eq!(decision.entry_price, 1019.0);

    let hold = session.generate_signal("INFY").await.unwrap();
    assert_eq!(hold.action, TradeAction::Hold);

    let report = session.execute_selected(1).await.unwrap();
    assert_eq!(report.message, HOLD_MESSAGE);

    let report = session.execute_selected(0).await.unwrap();
    assert!(report.message.contains("Simulated BUY trade for TCS logged."));

    let recent = session.history().recent(5);
    assert_eq!(recent.len(), 2);
    assert!(recent[0].executed);
    assert!(!recent[1].executed);
}

#[tokio::test]
async fn unknown_symbol_places_no_live_order() {
    let store = ingested_store(&[]).await;
    let mut broker = MockBroker::new();
    broker.expect_place_order().never();

    let signals = SignalGenerator::new(store, Arc::new(inference()), SignalSettings::default());
    let mut ids = security_ids();
    ids.remove("TCS");
    let gateway = ExecutionGateway::new(Arc::new(LiveExecutor::new(Arc::new(broker))), ids);
    let mut session = TradingSession::new(signals, gateway, AutoExecutePolicy::default());

    session.generate_signal("TCS").await.unwrap();
    let err = session.execute_selected(0).await.unwrap_err();

    assert_eq!(err.to_string(), "Security ID not found for TCS");
    assert!(!session.history().recent(1)[0].executed);
}

#[tokio::test]
async fn auto_execution_submits_live_orders_within_limits() {
    let store = ingested_store(&["RELIANCE"]).await;
    let mut broker = MockBroker::new();
    broker
        .expect_place_order()
        .withf(|order| order.quantity == 1 && order.price == 0.0)
        .times(2)
        .returning(|order| {
            Ok(OrderConfirmation {
                order_id: format!("ORD-{}", order.security_id),
                status: "TRANSIT".to_string(),
            })
        });

    let policy = AutoExecutePolicy::new(
        true,
        RiskLimits {
            min_confidence: 7,
            max_risk_score: 5,
            max_daily_trades: 2,
        },
    );
    let mut session = session(store, Arc::new(LiveExecutor::new(Arc::new(broker))), policy);

    let report = session.run_auto(&watchlist()).await.unwrap();

    assert_eq!(report.executed(), 2);
    assert!(matches!(&report.outcomes[0], AutoOutcome::Executed { message, .. } if message == "Order placed: ORD-11536 (TRANSIT)"));
    assert_eq!(report.outcomes[1], AutoOutcome::Held { symbol: "INFY".to_string() });
    assert!(matches!(&report.outcomes[2], AutoOutcome::Failed { symbol, .. } if symbol == "RELIANCE"));
    assert!(matches!(&report.outcomes[3], AutoOutcome::Executed { symbol, .. } if symbol == "HDFCBANK"));
    assert!(matches!(&report.outcomes[4], AutoOutcome::Skipped { symbol, .. } if symbol == "SBIN"));

    // TCS, INFY, HDFCBANK, SBIN recorded; RELIANCE had no data
    assert_eq!(session.history().len(), 4);
    assert_eq!(session.history().iter().filter(|d| d.executed).count(), 2);
}

#[tokio::test]
async fn ledger_shows_last_five_and_clears() {
    let store = ingested_store(&[]).await;
    let mut session = session(store, Arc::new(SimulatedExecutor), AutoExecutePolicy::default());

    let mut ids = Vec::new();
    for symbol in ["TCS", "INFY", "SBIN", "HDFCBANK", "RELIANCE", "TCS", "SBIN"] {
        ids.push(session.generate_signal(symbol).await.unwrap().id);
    }

    let recent: Vec<_> = session.history().recent(5).iter().map(|d| d.id).collect();
    assert_eq!(recent, ids[2..]);

    session.clear_history();
    assert!(session.history().recent(5).is_empty());
}
