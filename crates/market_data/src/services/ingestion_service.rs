use std::sync::Arc;

use storage::BarStore;
use thiserror::Error;
use tracing::{info, warn};

use crate::traits::{HistorySource, Interval};

pub const HISTORY_BARS: u32 = 100;

#[derive(Error, Debug, PartialEq)]
pub enum IngestError {
    #[error("No symbols requested")]
    NoSymbols,
    #[error("Failed to fetch data for all stocks. Errors: {}", .0.join(", "))]
    AllFailed(Vec<String>),
}

/// Outcome of a run in which at least one symbol was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub requested: usize,
    pub updated: Vec<String>,
    pub errors: Vec<String>,
    pub inserted_rows: u64,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn message(&self) -> String {
        if self.is_complete() {
            format!("All {} stocks updated successfully", self.updated.len())
        } else {
            format!(
                "Partially successful: {}/{} stocks updated ({}). Errors: {}",
                self.updated.len(),
                self.requested,
                self.updated.join(", "),
                self.errors.join(", ")
            )
        }
    }
}

/// Pulls daily bars for a batch of symbols and stores the missing ones.
pub struct DataIngestion {
    source: Arc<dyn HistorySource>,
    store: Arc<dyn BarStore>,
    exchange: String,
    bar_count: u32,
}

impl DataIngestion {
    pub fn new(source: Arc<dyn HistorySource>, store: Arc<dyn BarStore>, exchange: &str) -> Self {
        Self {
            source,
            store,
            exchange: exchange.to_string(),
            bar_count: HISTORY_BARS,
        }
    }

    pub fn with_bar_count(mut self, bar_count: u32) -> Self {
        self.bar_count = bar_count;
        self
    }

    /// Symbols are processed one after another, one commit each, so a failure
    /// on one symbol never rolls back the ones already stored.
    pub async fn ingest(&self, symbols: &[String]) -> Result<IngestReport, IngestError> {
        if symbols.is_empty() {
            return Err(IngestError::NoSymbols);
        }

        let mut report = IngestReport {
            requested: symbols.len(),
            updated: Vec::new(),
            errors: Vec::new(),
            inserted_rows: 0,
        };

        for symbol in symbols {
            info!("Fetching data for {}...", symbol);

            let bars = match self
                .source
                .get_history(symbol, &self.exchange, Interval::Daily, self.bar_count)
                .await
            {
                Ok(bars) if bars.is_empty() => {
                    warn!("No data found for {}. Skipping...", symbol);
                    report.errors.push(format!("No data found for {}", symbol));
                    continue;
                }
                Ok(bars) => bars,
                Err(e) => {
                    warn!("Failed to fetch data for {}: {}", symbol, e);
                    report.errors.push(format!("Error processing {}: {}", symbol, e));
                    continue;
                }
            };

            match self.store.insert_missing(&bars).await {
                Ok(inserted) => {
                    info!(
                        "Data stored for {}: {} new of {} fetched bars",
                        symbol,
                        inserted,
                        bars.len()
                    );
                    report.inserted_rows += inserted;
                    report.updated.push(symbol.clone());
                }
                Err(e) => {
                    warn!("Failed to store data for {}: {}", symbol, e);
                    report.errors.push(format!("Error processing {}: {}", symbol, e));
                }
            }
        }

        if report.updated.is_empty() {
            return Err(IngestError::AllFailed(report.errors));
        }
        Ok(report)
    }
}
