use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use anyhow::{Context, Result};
use crate::catalog::QueryOptions;

/// Environment variables that override file settings
pub const ENV_HTTP_ADDR: &str = "CONSUL_HTTP_ADDR";
pub const ENV_HTTP_TOKEN: &str = "CONSUL_HTTP_TOKEN";
pub const ENV_DATACENTER: &str = "CONSUL_DATACENTER";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Datacenter used when a query does not name one
    #[serde(default)]
    pub datacenter: Option<String>,
    /// Added to the blocking wait time to get the HTTP request timeout
    #[serde(default = "default_timeout_headroom")]
    pub timeout_headroom_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_wait")]
    pub wait_secs: u64,
    #[serde(default)]
    pub allow_stale: bool,
}

fn default_address() -> String {
    "http://127.0.0.1:8500".to_string()
}

fn default_timeout_headroom() -> u64 {
    5
}

fn default_wait() -> u64 {
    60
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: None,
            datacenter: None,
            timeout_headroom_secs: default_timeout_headroom(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            wait_secs: default_wait(),
            allow_stale: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply CONSUL_HTTP_ADDR, CONSUL_HTTP_TOKEN and CONSUL_DATACENTER
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup(ENV_HTTP_ADDR).filter(|s| !s.is_empty()) {
            self.catalog.address = if addr.contains("://") {
                addr
            } else {
                format!("http://{}", addr)
            };
        }
        if let Some(token) = lookup(ENV_HTTP_TOKEN).filter(|s| !s.is_empty()) {
            self.catalog.token = Some(token);
        }
        if let Some(dc) = lookup(ENV_DATACENTER).filter(|s| !s.is_empty()) {
            self.catalog.datacenter = Some(dc);
        }
    }

    /// Base options for lookups; query fields are layered on by fetch
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            datacenter: self.catalog.datacenter.clone(),
            wait_time: Some(Duration::from_secs(self.query.wait_secs)),
            allow_stale: self.query.allow_stale,
            ..QueryOptions::default()
        }
    }
}
