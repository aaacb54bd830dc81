//! Configuration types for agentdesk.
//!
//! `ServerConfig` is the optional `config.toml` in the data directory.
//! `DatabaseConfig` is derived from the `DB_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings loaded from `{data_dir}/config.toml`. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Upper bound on a single upstream model call. Absent means no client
    /// timeout; the transport's own limits apply.
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,

    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    #[serde(default = "default_log_per_page")]
    pub default_log_per_page: u32,

    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,

    /// Create the `admin`/`user` roles and the `admin` user on startup.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
}

fn default_per_page() -> u32 {
    10
}

fn default_log_per_page() -> u32 {
    20
}

fn default_max_per_page() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            upstream_timeout_secs: None,
            default_per_page: default_per_page(),
            default_log_per_page: default_log_per_page(),
            max_per_page: default_max_per_page(),
            seed_defaults: true,
        }
    }
}

/// Storage backend selected by `DB_TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Sqlite {
        path: PathBuf,
    },
    MySql {
        host: String,
        port: u16,
        name: String,
        user: String,
        password: Option<String>,
    },
}

impl DatabaseConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::MySql { .. } => "mysql",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported DB_TYPE '{0}' (expected sqlite or mysql)")]
    UnknownDbType(String),

    #[error("{0} must be set when DB_TYPE=mysql")]
    MissingVar(&'static str),

    #[error("invalid DB_PORT '{0}'")]
    InvalidPort(String),

    #[error("the {0} backend is not available in this build; use DB_TYPE=sqlite")]
    UnsupportedBackend(&'static str),
}
