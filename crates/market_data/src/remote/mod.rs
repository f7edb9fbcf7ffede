pub mod dhan_client;
pub mod history_client;
pub mod history_response;

pub use dhan_client::DhanClient;
pub use history_client::HttpHistoryClient;
pub use history_response::{HistoryBar, HistoryResponse};
