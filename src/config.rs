use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Process-wide settings, loaded once at startup and passed down explicitly.
#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Shared secret for the cycle trigger endpoint. `None` disables triggers.
    #[serde(default)]
    pub cron_secret: Option<String>,

    #[serde(default = "default_probe_timeout_seconds")]
    pub probe_timeout_seconds: u64,

    /// Run cycles in-process on this interval, in addition to triggers.
    #[serde(default)]
    pub check_interval_seconds: Option<u64>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Take client addresses from `X-Forwarded-For`. Enable only behind a
    /// reverse proxy that sets the header itself.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    listen_addr: Option<String>,
    cron_secret: Option<String>,
    probe_timeout_seconds: Option<u64>,
    check_interval_seconds: Option<u64>,
    max_connections: Option<u32>,
    log_dir: Option<String>,
    trust_forwarded_for: Option<bool>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_probe_timeout_seconds() -> u64 {
    10
}

fn default_max_connections() -> u32 {
    10
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let contents = fs::read_to_string(path_str).map_err(|source| ConfigError::Read {
                    path: path_str.to_string(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path_str.to_string(),
                    source,
                })?
            }
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()?;

        // 3. Merge: environment overrides file
        Self::merge(file_config, env_config)
    }

    fn merge(file: PartialServerConfig, env: PartialServerConfig) -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            database_url: env
                .database_url
                .or(file.database_url)
                .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            listen_addr: env
                .listen_addr
                .or(file.listen_addr)
                .unwrap_or_else(default_listen_addr),
            cron_secret: env
                .cron_secret
                .or(file.cron_secret)
                .filter(|s| !s.is_empty()),
            probe_timeout_seconds: env
                .probe_timeout_seconds
                .or(file.probe_timeout_seconds)
                .unwrap_or_else(default_probe_timeout_seconds)
                .max(1),
            check_interval_seconds: env
                .check_interval_seconds
                .or(file.check_interval_seconds)
                .filter(|secs| *secs > 0),
            max_connections: env
                .max_connections
                .or(file.max_connections)
                .unwrap_or_else(default_max_connections),
            log_dir: env.log_dir.or(file.log_dir).unwrap_or_else(default_log_dir),
            trust_forwarded_for: env
                .trust_forwarded_for
                .or(file.trust_forwarded_for)
                .unwrap_or(false),
        })
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn check_interval(&self) -> Option<Duration> {
        self.check_interval_seconds.map(Duration::from_secs)
    }
}
