use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FundLimits {
    // The broker API spells this field "availabelBalance".
    #[serde(alias = "availabelBalance")]
    pub available_balance: f64,
    pub sod_limit: f64,
    pub utilized_amount: f64,
    pub withdrawable_balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    pub trading_symbol: String,
    pub security_id: String,
    pub position_type: String,
    pub product_type: String,
    pub net_qty: i64,
    pub buy_avg: f64,
    pub sell_avg: f64,
    pub realized_profit: f64,
    pub unrealized_profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Holding {
    pub trading_symbol: String,
    pub security_id: String,
    #[serde(alias = "totalQty")]
    pub quantity: i64,
    #[serde(alias = "avgCostPrice")]
    pub buy_avg: f64,
    #[serde(alias = "lastTradedPrice")]
    pub ltp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub funds: FundLimits,
    pub positions: Vec<Position>,
    pub holdings: Vec<Holding>,
    pub total_investment: f64,
    pub current_value: f64,
    pub profit_loss: f64,
}

impl AccountSummary {
    pub fn new(funds: FundLimits, positions: Vec<Position>, holdings: Vec<Holding>) -> Self {
        let total_investment = holdings
            .iter()
            .map(|h| h.buy_avg * h.quantity as f64)
            .sum::<f64>();
        let current_value = holdings
            .iter()
            .map(|h| h.ltp * h.quantity as f64)
            .sum::<f64>();

        Self {
            funds,
            positions,
            holdings,
            total_investment,
            current_value,
            profit_loss: current_value - total_investment,
        }
    }
}
