pub mod account_service;
pub mod execution_service;

pub use account_service::{AccountError, account_summary};
pub use execution_service::{
    ExecutionError, ExecutionGateway, ExecutionReport, HOLD_MESSAGE, LiveExecutor, OrderExecutor,
    SimulatedExecutor,
};
