use async_trait::async_trait;
use common::models::{
    BarInsert, FundLimits, Holding, OrderConfirmation, OrderRequest, Position,
};

/// Conversion from a decoded vendor payload into rows the store accepts.
pub trait RemoteResponse<T> {
    fn to_insertable(&self, symbol: &str) -> anyhow::Result<T>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Daily,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "1D",
        }
    }
}

/// Historical bars collaborator. An empty vector means "no data".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn get_history(
        &self,
        symbol: &str,
        exchange: &str,
        interval: Interval,
        bar_count: u32,
    ) -> anyhow::Result<Vec<BarInsert>>;
}

/// Order placement and read-only account queries against the broker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerApi: Send + Sync {
    async fn place_order(&self, order: &OrderRequest) -> anyhow::Result<OrderConfirmation>;

    async fn get_funds(&self) -> anyhow::Result<FundLimits>;

    async fn get_positions(&self) -> anyhow::Result<Vec<Position>>;

    async fn get_holdings(&self) -> anyhow::Result<Vec<Holding>>;
}
