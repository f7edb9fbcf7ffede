use common::models::Bar;
use serde::Serialize;

use crate::indicators::simple_moving_average;

pub const SHORT_SMA: usize = 20;
pub const LONG_SMA: usize = 50;
pub const RECENT_ROWS: usize = 5;

/// One stored bar with the moving averages computed at that point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarFeatures {
    pub datetime: String,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
}

/// Summary statistics fed to the analysis prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub last_price: f64,
    pub prev_price: f64,
    pub change_pct: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub recent: Vec<BarFeatures>,
}

impl PriceSnapshot {
    /// `bars` must be in ascending time order. Returns `None` with fewer than
    /// two bars since the daily change is undefined.
    pub fn from_bars(symbol: &str, bars: &[Bar]) -> Option<Self> {
        if bars.len() < 2 {
            return None;
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let sma_20 = simple_moving_average(&closes, SHORT_SMA);
        let sma_50 = simple_moving_average(&closes, LONG_SMA);

        let last_price = closes[closes.len() - 1];
        let prev_price = closes[closes.len() - 2];
        let change_pct = if prev_price != 0.0 {
            (last_price - prev_price) / prev_price * 100.0
        } else {
            0.0
        };

        let start = bars.len().saturating_sub(RECENT_ROWS);
        let recent = bars[start..]
            .iter()
            .zip(&sma_20[start..])
            .zip(&sma_50[start..])
            .map(|((bar, s20), s50)| BarFeatures {
                datetime: bar.datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
                symbol: bar.symbol.clone(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                sma_20: *s20,
                sma_50: *s50,
            })
            .collect();

        Some(Self {
            symbol: symbol.to_string(),
            last_price,
            prev_price,
            change_pct,
            sma_20: sma_20.last().copied().flatten(),
            sma_50: sma_50.last().copied().flatten(),
            recent,
        })
    }
}
