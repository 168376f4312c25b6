/// Install manifest and directory configuration
pub mod configs;
/// Coloured levelled logger
pub mod log;

pub use configs::{InstallConfig, Manifest, StageRequest, StageSource, DEFAULT_PREFIX};
pub use log::{log, LogLevel};
