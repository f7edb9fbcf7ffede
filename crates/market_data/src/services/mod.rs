pub mod ingestion_service;

pub use ingestion_service::{DataIngestion, IngestError, IngestReport, HISTORY_BARS};
