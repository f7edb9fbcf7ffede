use std::sync::Arc;

use chrono::Utc;
use common::models::TradeDecision;
use storage::BarStore;
use tracing::{debug, info, warn};

use crate::decision_parser::parse_decision;
use crate::error::SignalError;
use crate::features::PriceSnapshot;
use crate::inference::{ChatMessage, InferenceClient};
use crate::prompt::render_prompt;

pub const DEFAULT_MODEL: &str = "DeepSeek-R1";
pub const SIGNAL_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct SignalSettings {
    pub model: String,
    pub lookback_days: i64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            lookback_days: SIGNAL_LOOKBACK_DAYS,
        }
    }
}

/// Turns stored bars into a validated trade decision via the inference API.
pub struct SignalGenerator {
    store: Arc<dyn BarStore>,
    inference: Arc<dyn InferenceClient>,
    settings: SignalSettings,
}

impl SignalGenerator {
    pub fn new(
        store: Arc<dyn BarStore>,
        inference: Arc<dyn InferenceClient>,
        settings: SignalSettings,
    ) -> Self {
        Self {
            store,
            inference,
            settings,
        }
    }

    pub async fn generate(&self, symbol: &str) -> Result<TradeDecision, SignalError> {
        // An unreachable store degrades to "no data" for this symbol.
        let bars = match self.store.read(symbol, self.settings.lookback_days).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!("Failed to read bars for {}: {}", symbol, e);
                Vec::new()
            }
        };

        let snapshot = PriceSnapshot::from_bars(symbol, &bars)
            .ok_or_else(|| SignalError::InsufficientData(symbol.to_string()))?;
        let prompt = render_prompt(&snapshot);

        info!(
            "Requesting decision for {} from {} ({} bars)",
            symbol,
            self.settings.model,
            bars.len()
        );
        let reply = self
            .inference
            .complete(&self.settings.model, &[ChatMessage::user(prompt)])
            .await
            .map_err(|e| SignalError::Inference(format!("{:#}", e)))?;
        debug!("Inference reply for {}: {}", symbol, reply);

        let decision = parse_decision(&reply, symbol, Utc::now())?;
        info!(
            "Decision for {}: {} (confidence {}, risk {})",
            symbol, decision.action, decision.confidence, decision.risk_score
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockInferenceClient;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use common::models::{Bar, BarInsert, TradeAction};
    use mockall::mock;
    use storage::StorageError;

    mock! {
        pub Store {}

        #[async_trait]
        impl BarStore for Store {
            async fn insert_missing(&self, bars: &[BarInsert]) -> Result<u64, StorageError>;
            async fn read(&self, symbol: &str, lookback_days: i64) -> Result<Vec<Bar>, StorageError>;
        }
    }

    fn bars(symbol: &str, count: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| Bar {
                id: i as i64,
                symbol: symbol.to_string(),
                datetime: start + Duration::days(i as i64),
                open: 3400.0,
                high: 3520.0,
                low: 3390.0,
                close: 3400.0 + i as f64 * 10.0,
                volume: 25_000.0,
            })
            .collect()
    }

    fn store_returning(count: usize) -> MockStore {
        let mut store = MockStore::new();
        store
            .expect_read()
            .withf(|symbol, days| symbol == "TCS" && *days == SIGNAL_LOOKBACK_DAYS)
            .returning(move |symbol, _| Ok(bars(symbol, count)));
        store
    }

    fn generator(store: MockStore, inference: MockInferenceClient) -> SignalGenerator {
        SignalGenerator::new(Arc::new(store), Arc::new(inference), SignalSettings::default())
    }

    #[tokio::test]
    async fn no_stored_bars_means_insufficient_data() {
        let mut inference = MockInferenceClient::new();
        inference.expect_complete().never();

        let err = generator(store_returning(0), inference)
            .generate("TCS")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Insufficient data for TCS");
    }

    #[tokio::test]
    async fn store_failure_is_treated_as_no_data() {
        let mut store = MockStore::new();
        store
            .expect_read()
            .returning(|_, _| Err(StorageError::Connection("unable to open database file".into())));
        let mut inference = MockInferenceClient::new();
        inference.expect_complete().never();

        let err = generator(store, inference).generate("TCS").await.unwrap_err();
        assert_eq!(err, SignalError::InsufficientData("TCS".to_string()));
    }

    #[tokio::test]
    async fn builds_decision_from_reply() {
        let mut inference = MockInferenceClient::new();
        inference
            .expect_complete()
            .withf(|model, messages| {
                model == DEFAULT_MODEL
                    && messages.len() == 1
                    && messages[0].content.starts_with("Analyze the following stock: TCS")
            })
            .times(1)
            .returning(|_, _| {
                Ok(r#"<think>uptrend</think>Here you go: {"stock":"TCS","action":"BUY","reasoning":"momentum","entry_price":3490,"stop_loss":3440,"take_profit":3600,"order_type":"INTRADAY","risk_score":3,"confidence":8}"#.to_string())
            });

        let before = Utc::now();
        let decision = generator(store_returning(10), inference)
            .generate("TCS")
            .await
            .unwrap();

        assert_eq!(decision.action, TradeAction::Buy);
        assert_eq!(decision.confidence, 8);
        assert!(decision.timestamp >= before);
    }

    #[tokio::test]
    async fn inference_failure_is_reported() {
        let mut inference = MockInferenceClient::new();
        inference
            .expect_complete()
            .returning(|_, _| Err(anyhow::anyhow!("HTTP 401: invalid api key")));

        let err = generator(store_returning(5), inference)
            .generate("TCS")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error getting trade decision: HTTP 401: invalid api key"
        );
    }

    #[tokio::test]
    async fn unparseable_reply_yields_no_decision() {
        let mut inference = MockInferenceClient::new();
        inference
            .expect_complete()
            .returning(|_, _| Ok("Markets are uncertain today.".to_string()));

        let err = generator(store_returning(5), inference)
            .generate("TCS")
            .await
            .unwrap_err();
        assert_eq!(err, SignalError::NoJsonFound);
    }
}
