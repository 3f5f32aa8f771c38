// ETL module: turns the raw tracks CSV into the cleaned table the analyzer reads.

pub mod diagnostics;
pub mod loader;

pub use loader::DataLoader;
