//! Gateway configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the Treegate gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Address the authorization service listens on.
    pub listen_addr: SocketAddr,

    /// Base URL of the remote permission authority.
    pub authority_url: String,
    /// Hard timeout for authority requests, in milliseconds.
    pub authority_timeout_ms: u64,
    /// External system id this gateway authorizes for.
    pub system_id: String,

    /// URI prefix under which repositories are served (e.g. "/svn").
    pub root_uri: String,
    /// Directory containing the repositories on disk.
    pub repository_root: PathBuf,
    /// Header carrying the pre-authenticated principal.
    pub principal_header: String,

    /// Cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    /// Cache capacity in entries.
    pub cache_capacity: usize,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Emit JSON logs.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8282".parse().expect("valid default address"),
            authority_url: "http://127.0.0.1:8080".to_string(),
            authority_timeout_ms: 10_000,
            system_id: String::new(),
            root_uri: "/svn".to_string(),
            repository_root: PathBuf::from("/var/lib/svn"),
            principal_header: "x-forwarded-user".to_string(),
            cache_ttl_secs: 180,
            cache_capacity: 100,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Authority request timeout as a `Duration`.
    pub fn authority_timeout(&self) -> Duration {
        Duration::from_millis(self.authority_timeout_ms)
    }

    /// Cache TTL as a `Duration`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
