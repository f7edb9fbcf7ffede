use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use common::config::BrokerCredentials;
use common::models::{
    FundLimits, Holding, OrderConfirmation, OrderKind, OrderRequest, Position, ProductType,
    TransactionSide,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use crate::traits::BrokerApi;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DhanOrderRequest<'a> {
    dhan_client_id: &'a str,
    transaction_type: TransactionSide,
    exchange_segment: &'a str,
    product_type: ProductType,
    order_type: OrderKind,
    validity: &'static str,
    security_id: &'a str,
    quantity: u32,
    price: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhanOrderResponse {
    order_id: String,
    order_status: String,
}

/// REST client for the Dhan v2 trading API.
#[derive(Clone)]
pub struct DhanClient {
    client: Client,
    base_url: String,
    client_id: String,
    access_token: String,
    exchange_segment: String,
}

impl DhanClient {
    pub fn new(
        base_url: &Url,
        credentials: BrokerCredentials,
        exchange: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("signal_desk/0.1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            client_id: credentials.client_id,
            access_token: credentials.access_token,
            exchange_segment: exchange_segment(exchange),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("access-token", &self.access_token)
            .header("client-id", &self.client_id)
            .header("Accept", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> anyhow::Result<T> {
        let resp = builder
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            error!("Dhan {} failed ({}): {}", what, status, error_text);
            bail!("{} failed ({}): {}", what, status, error_text);
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to parse {} response", what))
    }
}

/// Equity cash segment for an exchange code, e.g. `NSE` -> `NSE_EQ`.
fn exchange_segment(exchange: &str) -> String {
    let exchange = exchange.trim().to_uppercase();
    if exchange.contains('_') {
        exchange
    } else {
        format!("{}_EQ", exchange)
    }
}

#[async_trait]
impl BrokerApi for DhanClient {
    async fn place_order(&self, order: &OrderRequest) -> anyhow::Result<OrderConfirmation> {
        let body = DhanOrderRequest {
            dhan_client_id: &self.client_id,
            transaction_type: order.side,
            exchange_segment: &self.exchange_segment,
            product_type: order.product_type,
            order_type: order.order_kind,
            validity: "DAY",
            security_id: &order.security_id,
            quantity: order.quantity,
            price: order.price,
        };

        info!(
            "Placing Order: {} {} x{} ({:?})",
            order.side, order.security_id, order.quantity, order.product_type
        );

        let builder = self.request(Method::POST, "/v2/orders").json(&body);
        let resp: DhanOrderResponse = self.send(builder, "Order placement").await?;

        Ok(OrderConfirmation {
            order_id: resp.order_id,
            status: resp.order_status,
        })
    }

    async fn get_funds(&self) -> anyhow::Result<FundLimits> {
        self.send(self.request(Method::GET, "/v2/fundlimit"), "Fund limit")
            .await
    }

    async fn get_positions(&self) -> anyhow::Result<Vec<Position>> {
        self.send(self.request(Method::GET, "/v2/positions"), "Positions")
            .await
    }

    async fn get_holdings(&self) -> anyhow::Result<Vec<Holding>> {
        self.send(self.request(Method::GET, "/v2/holdings"), "Holdings")
            .await
    }
}
