pub mod account;
pub mod bar;
pub mod decision;
pub mod order;

pub use account::{AccountSummary, FundLimits, Holding, Position};
pub use bar::{Bar, BarInsert};
pub use decision::{ExecutionStatus, OrderType, TradeAction, TradeDecision};
pub use order::{OrderConfirmation, OrderKind, OrderRequest, ProductType, TransactionSide};
