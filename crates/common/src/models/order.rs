use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{OrderType, TradeAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionSide {
    Buy,
    Sell,
}

impl TransactionSide {
    /// HOLD has no side.
    pub fn from_action(action: TradeAction) -> Option<Self> {
        match action {
            TradeAction::Buy => Some(Self::Buy),
            TradeAction::Sell => Some(Self::Sell),
            TradeAction::Hold => None,
        }
    }
}

impl fmt::Display for TransactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    Market,
    Limit,
}

/// Broker product codes: INTRADAY squares off same day, CNC is delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductType {
    Intraday,
    Cnc,
}

impl From<OrderType> for ProductType {
    fn from(value: OrderType) -> Self {
        match value {
            OrderType::Intraday => Self::Intraday,
            OrderType::Delivery => Self::Cnc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub security_id: String,
    pub side: TransactionSide,
    pub quantity: u32,
    pub order_kind: OrderKind,
    pub product_type: ProductType,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_type_follows_order_type() {
        assert_eq!(ProductType::from(OrderType::Intraday), ProductType::Intraday);
        assert_eq!(ProductType::from(OrderType::Delivery), ProductType::Cnc);
    }

    #[test]
    fn hold_has_no_side() {
        assert_eq!(TransactionSide::from_action(TradeAction::Hold), None);
        assert_eq!(
            TransactionSide::from_action(TradeAction::Sell),
            Some(TransactionSide::Sell)
        );
    }
}
