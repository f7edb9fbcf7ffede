use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use common::models::BarInsert;
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::remote::history_response::HistoryResponse;
use crate::traits::{HistorySource, Interval, RemoteResponse};

const MAX_RETRIES: u32 = 3;

/// HTTP client for the historical-bars feed.
///
/// `GET {base}/history?symbol=..&exchange=..&interval=1D&n_bars=..`
pub struct HttpHistoryClient {
    client: Client,
    base_url: String,
}

impl HttpHistoryClient {
    pub fn new(base_url: &Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("signal_desk/0.1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    async fn make_request(
        &self,
        symbol: &str,
        exchange: &str,
        interval: Interval,
        bar_count: u32,
    ) -> anyhow::Result<Option<HistoryResponse>> {
        let url = format!("{}/history", self.base_url);
        let n_bars = bar_count.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("exchange", exchange),
                ("interval", interval.as_str()),
                ("n_bars", n_bars.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            bail!("HTTP 429: Too Many Requests");
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {}: {}", status.as_u16(), body);
        }

        let data = response
            .json::<HistoryResponse>()
            .await
            .context("Failed to parse JSON response")?;
        Ok(Some(data))
    }

    fn is_rate_limit_error(error: &anyhow::Error) -> bool {
        error.to_string().contains("429")
    }
}

#[async_trait]
impl HistorySource for HttpHistoryClient {
    async fn get_history(
        &self,
        symbol: &str,
        exchange: &str,
        interval: Interval,
        bar_count: u32,
    ) -> anyhow::Result<Vec<BarInsert>> {
        let mut retry_count = 0;

        loop {
            match self.make_request(symbol, exchange, interval, bar_count).await {
                Ok(Some(response)) => {
                    let bars = response.to_insertable(symbol)?;
                    debug!("Fetched {} bars for {}:{}", bars.len(), exchange, symbol);
                    return Ok(bars);
                }
                Ok(None) => return Ok(Vec::new()),
                Err(e) if Self::is_rate_limit_error(&e) => {
                    retry_count += 1;
                    if retry_count > MAX_RETRIES {
                        bail!("Max retries exceeded for rate limit");
                    }

                    let backoff_seconds = 2_u64.pow(retry_count);
                    warn!(
                        "Rate limited for symbol {}, backing off for {} seconds (attempt {}/{})",
                        symbol, backoff_seconds, retry_count, MAX_RETRIES
                    );
                    sleep(Duration::from_secs(backoff_seconds)).await;
                }
                Err(e) => bail!("Failed to fetch history for {}: {}", symbol, e),
            }
        }
    }
}
