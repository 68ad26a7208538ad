pub mod config;
pub mod observations;
pub mod report;

pub use config::{load_config, DetectorConfig, PriorConfig};
pub use observations::{load_batches, parse_delimiter, ObservationBatch};
pub use report::ReportWriter;
