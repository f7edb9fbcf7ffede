use chrono::{DateTime, Utc};
use storage::BarStore;
use tracing::warn;

pub const PERFORMANCE_LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolPerformance {
    pub symbol: String,
    pub latest_close: f64,
    /// Change from the first to the last close in the window, in percent.
    pub change_pct: f64,
    pub last_updated: DateTime<Utc>,
}

/// Week-over-week summary for each symbol. Symbols without stored bars are
/// left out.
pub async fn watchlist_performance(store: &dyn BarStore, symbols: &[String]) -> Vec<SymbolPerformance> {
    let mut rows = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let bars = match store.read(symbol, PERFORMANCE_LOOKBACK_DAYS).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!("Failed to read bars for {}: {}", symbol, e);
                continue;
            }
        };
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            continue;
        };

        let change_pct = if first.close != 0.0 {
            (last.close - first.close) / first.close * 100.0
        } else {
            0.0
        };

        rows.push(SymbolPerformance {
            symbol: symbol.clone(),
            latest_close: last.close,
            change_pct,
            last_updated: last.datetime,
        });
    }

    rows
}
