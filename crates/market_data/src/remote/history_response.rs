use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use common::models::BarInsert;

use crate::traits::RemoteResponse;

#[derive(Deserialize, Debug)]
pub struct HistoryResponse {
    #[serde(default)]
    pub bars: Vec<HistoryBar>,
}

#[derive(Deserialize, Debug)]
pub struct HistoryBar {
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl HistoryBar {
    fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
    }
}

impl RemoteResponse<Vec<BarInsert>> for HistoryResponse {
    fn to_insertable(&self, symbol: &str) -> anyhow::Result<Vec<BarInsert>> {
        let mut bars = Vec::with_capacity(self.bars.len());
        for row in &self.bars {
            if !row.is_valid() {
                warn!("Dropping malformed bar for {} at {}", symbol, row.datetime);
                continue;
            }
            bars.push(BarInsert {
                symbol: symbol.to_string(),
                datetime: row.datetime,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rows_and_drops_malformed_ones() {
        let payload = r#"{
            "symbol": "NSE:TCS",
            "bars": [
                {"datetime": "2024-03-01T00:00:00Z", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 100},
                {"datetime": "2024-03-04T00:00:00Z", "open": -1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 100},
                {"datetime": "2024-03-05T00:00:00Z", "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.7}
            ]
        }"#;

        let response: HistoryResponse = serde_json::from_str(payload).unwrap();
        let bars = response.to_insertable("TCS").unwrap();

        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.symbol == "TCS"));
        assert_eq!(bars[1].close, 1.7);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn missing_bars_field_is_empty() {
        let response: HistoryResponse = serde_json::from_str("{}").unwrap();
        assert!(response.to_insertable("TCS").unwrap().is_empty());
    }
}
