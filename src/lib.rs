pub mod app;
pub mod config;
pub mod dns_probe;
pub mod probe;
pub mod stats;
