use common::models::AccountSummary;
use market_data::BrokerApi;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Error fetching account details: {0}")]
pub struct AccountError(pub String);

/// Funds, positions and holdings in one read-only snapshot.
pub async fn account_summary(broker: &dyn BrokerApi) -> Result<AccountSummary, AccountError> {
    let fetched = async {
        let funds = broker.get_funds().await?;
        let positions = broker.get_positions().await?;
        let holdings = broker.get_holdings().await?;
        anyhow::Ok((funds, positions, holdings))
    }
    .await;

    match fetched {
        Ok((funds, positions, holdings)) => {
            let summary = AccountSummary::new(funds, positions, holdings);
            info!(
                "Account: {} positions, {} holdings, P/L {:.2}",
                summary.positions.len(),
                summary.holdings.len(),
                summary.profit_loss
            );
            Ok(summary)
        }
        Err(e) => {
            error!("Failed to fetch account details: {:#}", e);
            Err(AccountError(format!("{:#}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::execution_service::tests::MockBroker;
    use common::models::{FundLimits, Holding};

    fn holding(symbol: &str, quantity: i64, buy_avg: f64, ltp: f64) -> Holding {
        Holding {
            trading_symbol: symbol.to_string(),
            quantity,
            buy_avg,
            ltp,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn summarises_holdings() {
        let mut broker = MockBroker::new();
        broker.expect_get_funds().returning(|| {
            Ok(FundLimits {
                available_balance: 50_000.0,
                sod_limit: 50_000.0,
                utilized_amount: 0.0,
                withdrawable_balance: 50_000.0,
            })
        });
        broker.expect_get_positions().returning(|| Ok(Vec::new()));
        broker.expect_get_holdings().returning(|| {
            Ok(vec![
                holding("TCS", 2, 3500.0, 3600.0),
                holding("SBIN", 10, 800.0, 790.0),
            ])
        });

        let summary = account_summary(&broker).await.unwrap();

        assert_eq!(summary.total_investment, 15_000.0);
        assert_eq!(summary.current_value, 15_100.0);
        assert_eq!(summary.profit_loss, 100.0);
    }

    #[tokio::test]
    async fn broker_error_is_wrapped() {
        let mut broker = MockBroker::new();
        broker
            .expect_get_funds()
            .returning(|| Err(anyhow::anyhow!("HTTP 500: upstream down")));

        let err = account_summary(&broker).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error fetching account details: HTTP 500: upstream down"
        );
    }
}
