use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};

/// Property names recognized by [`AdapterConfig::from_properties`], matching
/// the names the benchmark harness passes through.
pub const PROP_HOST: &str = "redis.host";
pub const PROP_PORT: &str = "redis.port";
pub const PROP_PASSWORD: &str = "redis.password";
pub const PROP_CLUSTER: &str = "redis.cluster";
pub const PROP_TIMEOUT: &str = "redis.timeout";
pub const PROP_LOGFILE: &str = "redis.logfile";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;

/// Connection target and options, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    /// Selects the cluster-aware connection mode.
    pub cluster: bool,
    /// Connect/response timeout in milliseconds, passed through to the
    /// client library. None leaves the library defaults in place.
    pub timeout_ms: Option<u64>,
    /// Base path for the binary operation log; logging is off when unset.
    pub datalog_path: Option<PathBuf>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            cluster: false,
            timeout_ms: None,
            datalog_path: None,
        }
    }
}

impl AdapterConfig {
    /// Build a config from harness-style string properties.
    ///
    /// Unrecognized properties are ignored; malformed numeric values are
    /// rejected. The cluster flag follows the original binding: only a
    /// case-insensitive `"true"` enables it, anything else is false.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = props.get(PROP_HOST) {
            config.host = host.clone();
        }
        if let Some(port) = props.get(PROP_PORT) {
            config.port = port
                .parse()
                .map_err(|_| AdapterError::Config(format!("bad {PROP_PORT} value {port:?}")))?;
        }
        if let Some(password) = props.get(PROP_PASSWORD) {
            config.password = Some(password.clone());
        }
        if let Some(cluster) = props.get(PROP_CLUSTER) {
            config.cluster = cluster.eq_ignore_ascii_case("true");
        }
        if let Some(timeout) = props.get(PROP_TIMEOUT) {
            let ms = timeout
                .parse()
                .map_err(|_| AdapterError::Config(format!("bad {PROP_TIMEOUT} value {timeout:?}")))?;
            config.timeout_ms = Some(ms);
        }
        if let Some(logfile) = props.get(PROP_LOGFILE) {
            config.datalog_path = Some(PathBuf::from(logfile));
        }
        Ok(config)
    }

    /// Load a config from a TOML file. Missing keys fall back to defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            AdapterError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        toml::from_str(&contents).map_err(|e| AdapterError::Config(e.to_string()))
    }

    pub fn with_cluster(mut self, cluster: bool) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_datalog_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.datalog_path = Some(path.into());
        self
    }
}
