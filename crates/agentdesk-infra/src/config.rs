//! Configuration loading for agentdesk.
//!
//! - [`load_server_config`] reads `config.toml` from the data directory and
//!   falls back to defaults when the file is missing or malformed.
//! - [`database_config_from_env`] turns the `DB_*` variables into a
//!   [`DatabaseConfig`].

use std::path::{Path, PathBuf};

use agentdesk_types::config::{ConfigError, DatabaseConfig, ServerConfig};

pub const DEFAULT_DB_NAME: &str = "agentdesk.db";
const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Data directory: `AGENTDESK_DATA_DIR`, else `~/.agentdesk`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AGENTDESK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".agentdesk")
}

/// Load `{data_dir}/config.toml`.
pub async fn load_server_config(data_dir: &Path) -> ServerConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServerConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServerConfig::default();
        }
    };

    match toml::from_str::<ServerConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServerConfig::default()
        }
    }
}

/// Build a [`DatabaseConfig`] from `DB_*` variables read through `lookup`.
///
/// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
/// Blank values count as unset.
pub fn database_config_from_env(
    data_dir: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<DatabaseConfig, ConfigError> {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let db_type = var("DB_TYPE").unwrap_or_else(|| "sqlite".to_string());
    match db_type.to_lowercase().as_str() {
        "sqlite" => {
            let name = var("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
            let path = PathBuf::from(&name);
            let path = if path.is_absolute() {
                path
            } else {
                data_dir.join(path)
            };
            Ok(DatabaseConfig::Sqlite { path })
        }
        "mysql" => {
            let port = match var("DB_PORT") {
                Some(raw) => raw
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort(raw))?,
                None => DEFAULT_MYSQL_PORT,
            };
            Ok(DatabaseConfig::MySql {
                host: var("DB_HOST").ok_or(ConfigError::MissingVar("DB_HOST"))?,
                port,
                name: var("DB_NAME").ok_or(ConfigError::MissingVar("DB_NAME"))?,
                user: var("DB_USER").ok_or(ConfigError::MissingVar("DB_USER"))?,
                password: var("DB_PASSWORD"),
            })
        }
        _ => Err(ConfigError::UnknownDbType(db_type)),
    }
}

/// The SQLite file to open, or an error for backends this build lacks.
pub fn sqlite_path(config: &DatabaseConfig) -> Result<&Path, ConfigError> {
    match config {
        DatabaseConfig::Sqlite { path } => Ok(path),
        other => Err(ConfigError::UnsupportedBackend(other.backend_name())),
    }
}
