pub mod performance_service;
pub mod signal_service;

pub use performance_service::{PERFORMANCE_LOOKBACK_DAYS, SymbolPerformance, watchlist_performance};
pub use signal_service::{DEFAULT_MODEL, SIGNAL_LOOKBACK_DAYS, SignalGenerator, SignalSettings};
