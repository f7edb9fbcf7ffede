pub mod bars_repo;

pub use bars_repo::BarsRepository;
