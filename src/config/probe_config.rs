use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::probe::report::DEFAULT_PERCENTILES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML in {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid duration {0:?}, expected e.g. 250ms, 1s, 1m30s or 2.5")]
    Duration(String),
    #[error("Unable to resolve server {host}:{port}: {reason}")]
    Resolve {
        host: String,
        port: u16,
        reason: String,
    },
}

/// Probe settings that can be kept in a YAML file.
/// Every key is optional; missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Destination port of the DNS server.
    pub port: u16,

    /// Pause between two attempts.
    #[serde(deserialize_with = "deserialize_duration")]
    pub interval: Duration,

    /// Number of attempts, zero or negative runs until interrupted.
    pub count: i64,

    /// Record type to query (A, AAAA, SOA, CNAME...).
    pub query_type: String,

    /// Upper bound for a single exchange.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    /// Value mapped onto the first histogram bucket, in milliseconds.
    pub histogram_offset: f64,

    /// Width of the finest histogram buckets, in milliseconds.
    pub histogram_resolution: f64,

    /// Percentiles listed in the final report.
    pub percentiles: Vec<f64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: 53,
            interval: Duration::from_secs(1),
            count: 0,
            query_type: "A".to_string(),
            timeout: Duration::from_secs(2),
            histogram_offset: 0.0,
            histogram_resolution: 0.1,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
        }
    }
}

impl ProbeConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Parse a duration such as `250ms`, `2s`, `1m30s` or `1h 5m`, or a bare
/// (possibly fractional) number of seconds.
pub fn parse_duration(text: &str) -> Result<Duration, ConfigError> {
    let trimmed = text.trim();
    let invalid = || ConfigError::Duration(text.to_string());
    if let Ok(seconds) = trimmed.parse::<f64>() {
        return Duration::try_from_secs_f64(seconds).map_err(|_| invalid());
    }
    humantime::parse_duration(trimmed).map_err(|_| invalid())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Duration::try_from_secs_f64(secs)
            .map_err(|_| serde::de::Error::custom(format!("invalid duration {secs}"))),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
