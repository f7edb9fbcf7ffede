pub mod remote;
pub mod services;
pub mod traits;

pub use traits::{BrokerApi, HistorySource, Interval};
