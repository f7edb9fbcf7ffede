use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "HOLD" => Ok(Self::Hold),
            other => Err(format!("expected BUY, SELL or HOLD, got {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Intraday,
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intraday => "INTRADAY",
            Self::Delivery => "DELIVERY",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INTRADAY" => Ok(Self::Intraday),
            "DELIVERY" => Ok(Self::Delivery),
            other => Err(format!("expected INTRADAY or DELIVERY, got {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionStatus {
    Simulated,
    Submitted { order_id: String, status: String },
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => write!(f, "SIMULATED"),
            Self::Submitted { order_id, status } => write!(f, "{} ({})", status, order_id),
        }
    }
}

/// Structured recommendation produced from one inference reply.
///
/// The execution fields stay empty until the execution gateway reports a
/// successful submission or simulation for this decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub id: Uuid,
    pub stock: String,
    pub action: TradeAction,
    pub reasoning: String,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub order_type: OrderType,
    pub risk_score: u8,
    pub confidence: u8,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub executed: bool,
    #[serde(default)]
    pub execution_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_status: Option<ExecutionStatus>,
}

impl TradeDecision {
    pub fn mark_executed(&mut self, status: ExecutionStatus, at: DateTime<Utc>) {
        self.executed = true;
        self.execution_time = Some(at);
        self.execution_status = Some(status);
    }

    /// One-line label used by selection lists.
    pub fn label(&self) -> String {
        format!(
            "{} | {} {} @ ₹{:.2}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.action,
            self.stock,
            self.entry_price
        )
    }
}
