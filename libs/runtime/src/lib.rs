//! Process-level plumbing shared by CoLearnHub binaries:
//! layered configuration and tracing initialisation.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, AppConfigProvider, AppSection, BackendConfig, CliArgs,
    ConfigProvider, LoggingConfig, Section,
};
