/// Service configuration loader - parses service.toml
///
/// Upstream URLs, body limits and the cache TTL live in the file so they
/// can be adjusted without recompiling. The NVE credential is never read
/// from the file; it comes from the environment only.

use chrono::TimeDelta;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::model::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "service.toml";

/// Environment variable carrying the NVE HydAPI key.
pub const API_KEY_ENV: &str = "NVE_API_KEY";
pub const LISTEN_ADDR_ENV: &str = "LISTEN_ADDR";

// ---------------------------------------------------------------------------
// TOML Configuration Structures
// ---------------------------------------------------------------------------

/// Root configuration, one table per concern.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub stores: StoresConfig,
    pub geology: GeologyConfig,
    pub hydrology: HydrologyConfig,

    /// Filled from `NVE_API_KEY`; absent means /api/hydrology answers 503.
    #[serde(skip)]
    pub nve_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub static_dir: String,
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "localhost:8080".to_string(),
            static_dir: "static".to_string(),
            worker_threads: 8,
        }
    }
}

/// Settings shared by every outbound request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "Norgesglass/1.0".to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Narvesen store locator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoresConfig {
    pub url: String,
    pub max_body_bytes: usize,
    pub cache_ttl_hours: i64,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            url: "https://narvesen.no/finn-butikk".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
            cache_ttl_hours: 24,
        }
    }
}

impl StoresConfig {
    /// Store cache TTL. Out-of-range hours are rejected by validation;
    /// an unvalidated value saturates instead of panicking.
    pub fn cache_ttl(&self) -> TimeDelta {
        TimeDelta::try_hours(self.cache_ttl_hours).unwrap_or(TimeDelta::MAX)
    }
}

/// NGU WMS endpoints, one per queryable layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeologyConfig {
    pub bedrock_url: String,
    pub sediment_url: String,
}

impl Default for GeologyConfig {
    fn default() -> Self {
        Self {
            bedrock_url: "https://geo.ngu.no/mapserver/BerggrunnWMS3".to_string(),
            sediment_url: "https://geo.ngu.no/mapserver/LosmasserWMS3".to_string(),
        }
    }
}

/// NVE HydAPI station search.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HydrologyConfig {
    pub stations_url: String,
    pub max_body_bytes: usize,
}

impl Default for HydrologyConfig {
    fn default() -> Self {
        Self {
            stations_url: "https://hydapi.nve.no/api/v1/Stations".to_string(),
            max_body_bytes: 512 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses configuration from TOML text. Missing tables and keys fall back
/// to their defaults.
pub fn parse_config(contents: &str, path: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads `path` if it exists, otherwise starts from defaults, then applies
/// environment overrides.
///
/// A missing file is not an error: the defaults describe the production
/// upstreams. A file that exists but cannot be read or parsed is.
pub fn load_config(path: &str) -> Result<ServiceConfig, ConfigError> {
    let mut config = if Path::new(path).exists() {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        parse_config(&contents, path)?
    } else {
        log::info!("{} not found, using built-in defaults", path);
        ServiceConfig::default()
    };

    config.apply_env_overrides(|key| env::var(key).ok());
    Ok(config)
}

impl ServiceConfig {
    /// Applies `LISTEN_ADDR` and `NVE_API_KEY`. Empty values count as unset.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = non_empty(LISTEN_ADDR_ENV) {
            self.server.listen_addr = addr;
        }
        self.nve_api_key = non_empty(API_KEY_ENV);
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.worker_threads == 0 {
            return Err(ConfigError::Invalid(
                "server.worker_threads must be at least 1".to_string(),
            ));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.stores.cache_ttl_hours <= 0 {
            return Err(ConfigError::Invalid(
                "stores.cache_ttl_hours must be positive".to_string(),
            ));
        }
        if TimeDelta::try_hours(self.stores.cache_ttl_hours).is_none() {
            return Err(ConfigError::Invalid(format!(
                "stores.cache_ttl_hours {} is out of range",
                self.stores.cache_ttl_hours
            )));
        }
        if self.stores.max_body_bytes == 0 || self.hydrology.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
