pub mod ledger;
pub mod services;
pub mod session;

pub use ledger::{EXECUTION_WINDOW, TradeHistory};
pub use session::{AutoExecutePolicy, AutoOutcome, AutoRunReport, SessionError, TradingSession};
