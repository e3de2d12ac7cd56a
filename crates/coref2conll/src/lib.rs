pub mod batch;
pub mod config;
pub mod pipeline;

pub use batch::{BatchSummary, check_output, convert_dir, convert_dirs, find_data_dirs};
pub use config::{Config, ConfigError};
pub use pipeline::{ConvertedDocument, Converter};
