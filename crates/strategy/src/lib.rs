pub mod decision_parser;
pub mod error;
pub mod features;
pub mod indicators;
pub mod inference;
pub mod prompt;
pub mod services;

pub use error::SignalError;
pub use inference::{ChatCompletionsClient, ChatMessage, InferenceClient};
pub use services::{SignalGenerator, SignalSettings};
