pub mod app_config;
pub mod probe_config;

pub use app_config::{AppConfig, Args, resolve_server};
pub use probe_config::{ConfigError, ProbeConfig, parse_duration};
