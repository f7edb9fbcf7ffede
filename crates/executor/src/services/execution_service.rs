use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::ExecutionMode;
use common::models::{
    ExecutionStatus, OrderKind, OrderRequest, OrderType, TradeAction, TradeDecision,
    TransactionSide,
};
use market_data::BrokerApi;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::ledger::TradeHistory;

pub const HOLD_MESSAGE: &str = "No trade executed as decision was to HOLD";

/// Fixed order size for every submitted decision.
pub const ORDER_QUANTITY: u32 = 1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Security ID not found for {0}")]
    UnknownSecurity(String),
    #[error("Error executing trade: {0}")]
    Broker(String),
    #[error("Error simulating trade execution: {0}")]
    Simulation(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// False only for HOLD, where nothing was sent anywhere.
    pub executed: bool,
    pub message: String,
}

impl ExecutionReport {
    fn held() -> Self {
        Self {
            executed: false,
            message: HOLD_MESSAGE.to_string(),
        }
    }
}

/// Places (or pretends to place) the order for a BUY/SELL decision.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    async fn submit(
        &self,
        decision: &TradeDecision,
        security_id: &str,
        side: TransactionSide,
        at: DateTime<Utc>,
    ) -> Result<(ExecutionStatus, String), ExecutionError>;
}

/// Sends a market order for one unit to the broker.
pub struct LiveExecutor {
    broker: Arc<dyn BrokerApi>,
}

impl LiveExecutor {
    pub fn new(broker: Arc<dyn BrokerApi>) -> Self {
        Self { broker }
    }
}

pub fn market_order(security_id: &str, side: TransactionSide, order_type: OrderType) -> OrderRequest {
    OrderRequest {
        security_id: security_id.to_string(),
        side,
        quantity: ORDER_QUANTITY,
        order_kind: OrderKind::Market,
        product_type: order_type.into(),
        price: 0.0,
    }
}

#[async_trait]
impl OrderExecutor for LiveExecutor {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Live
    }

    async fn submit(
        &self,
        decision: &TradeDecision,
        security_id: &str,
        side: TransactionSide,
        _at: DateTime<Utc>,
    ) -> Result<(ExecutionStatus, String), ExecutionError> {
        let order = market_order(security_id, side, decision.order_type);
        info!(
            "Placing {} {:?} order for {} ({})",
            side, order.product_type, decision.stock, security_id
        );

        let confirmation = self.broker.place_order(&order).await.map_err(|e| {
            error!("Order for {} failed: {:#}", decision.stock, e);
            ExecutionError::Broker(format!("{:#}", e))
        })?;

        let message = format!(
            "Order placed: {} ({})",
            confirmation.order_id, confirmation.status
        );
        Ok((
            ExecutionStatus::Submitted {
                order_id: confirmation.order_id,
                status: confirmation.status,
            },
            message,
        ))
    }
}

#[derive(Serialize)]
struct SimulatedConfirmation<'a> {
    status: &'static str,
    message: String,
    trade_details: TradeDetails<'a>,
}

#[derive(Serialize)]
struct TradeDetails<'a> {
    stock: &'a str,
    action: TradeAction,
    entry_price: f64,
    stop_loss: f64,
    take_profit: f64,
    order_type: OrderType,
    risk_score: u8,
    confidence: u8,
    timestamp: String,
}

/// Records the order without contacting the broker.
#[derive(Debug, Default)]
pub struct SimulatedExecutor;

#[async_trait]
impl OrderExecutor for SimulatedExecutor {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Simulated
    }

    async fn submit(
        &self,
        decision: &TradeDecision,
        _security_id: &str,
        _side: TransactionSide,
        at: DateTime<Utc>,
    ) -> Result<(ExecutionStatus, String), ExecutionError> {
        let confirmation = SimulatedConfirmation {
            status: "success",
            message: format!(
                "Simulated {} trade for {} logged.",
                decision.action, decision.stock
            ),
            trade_details: TradeDetails {
                stock: &decision.stock,
                action: decision.action,
                entry_price: decision.entry_price,
                stop_loss: decision.stop_loss,
                take_profit: decision.take_profit,
                order_type: decision.order_type,
                risk_score: decision.risk_score,
                confidence: decision.confidence,
                timestamp: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        };

        let message = serde_json::to_string_pretty(&confirmation)
            .map_err(|e| ExecutionError::Simulation(e.to_string()))?;
        info!("Simulated {} trade for {}", decision.action, decision.stock);
        Ok((ExecutionStatus::Simulated, message))
    }
}

/// Applies a decision through the configured executor and records the outcome.
pub struct ExecutionGateway {
    executor: Arc<dyn OrderExecutor>,
    security_ids: BTreeMap<String, String>,
}

impl ExecutionGateway {
    pub fn new(executor: Arc<dyn OrderExecutor>, security_ids: BTreeMap<String, String>) -> Self {
        Self {
            executor,
            security_ids,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.executor.mode()
    }

    /// HOLD returns immediately without touching the executor or the
    /// history. On success the decision is marked executed and its history
    /// entry is replaced, or appended if it was not recorded yet.
    pub async fn execute(
        &self,
        decision: &mut TradeDecision,
        history: &mut TradeHistory,
    ) -> Result<ExecutionReport, ExecutionError> {
        let Some(side) = TransactionSide::from_action(decision.action) else {
            info!("{}: HOLD, nothing to execute", decision.stock);
            return Ok(ExecutionReport::held());
        };

        let security_id = self
            .security_ids
            .get(&decision.stock)
            .ok_or_else(|| ExecutionError::UnknownSecurity(decision.stock.clone()))?;

        let at = Utc::now();
        let (status, message) = self
            .executor
            .submit(decision, security_id, side, at)
            .await?;

        decision.mark_executed(status, at);
        history.upsert(decision.clone());

        Ok(ExecutionReport {
            executed: true,
            message,
        })
    }
}
