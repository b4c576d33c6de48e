//! Configuration management for the Elpriser server

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::annotations::StorageBackend;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub annotations: AnnotationsConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AnnotationsConfig {
    pub backend: StorageBackend,
    pub database_url: String,
    pub file_path: PathBuf,
    /// Use the file if SQLite cannot be opened at startup
    pub fallback_to_file: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    /// Shared secret for moderation; `None` disables admin endpoints
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            annotations: AnnotationsConfig {
                backend: StorageBackend::Sqlite,
                database_url: "sqlite:./annotations.db".to_string(),
                file_path: PathBuf::from("./annotations.json"),
                fallback_to_file: true,
            },
            admin: AdminConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: match env::var("SERVER_PORT") {
                    Ok(port) => port.parse().map_err(|_| ConfigError::InvalidValue {
                        var: "SERVER_PORT",
                        value: port,
                    })?,
                    Err(_) => defaults.server.port,
                },
            },
            annotations: AnnotationsConfig {
                backend: match env::var("ANNOTATIONS_BACKEND") {
                    Ok(name) => parse_backend(&name)?,
                    Err(_) => defaults.annotations.backend,
                },
                database_url: env::var("DATABASE_URL").unwrap_or(defaults.annotations.database_url),
                file_path: env::var("ANNOTATIONS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.annotations.file_path),
                fallback_to_file: match env::var("ANNOTATIONS_FALLBACK") {
                    Ok(flag) => parse_flag("ANNOTATIONS_FALLBACK", flag)?,
                    Err(_) => defaults.annotations.fallback_to_file,
                },
            },
            admin: AdminConfig {
                password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            },
        })
    }
}

fn parse_backend(name: &str) -> Result<StorageBackend, ConfigError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "sqlite" | "db" => Ok(StorageBackend::Sqlite),
        "file" | "json" => Ok(StorageBackend::File),
        _ => Err(ConfigError::InvalidValue {
            var: "ANNOTATIONS_BACKEND",
            value: name.to_string(),
        }),
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    parse_bool(&value).ok_or(ConfigError::InvalidValue { var, value })
}

/// Lenient boolean used for env flags and query switches
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("sqlite").unwrap(), StorageBackend::Sqlite);
        assert_eq!(parse_backend(" JSON ").unwrap(), StorageBackend::File);
        assert!(matches!(
            parse_backend("postgres"),
            Err(ConfigError::InvalidValue { var: "ANNOTATIONS_BACKEND", .. })
        ));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "true".to_string()).unwrap());
        assert!(!parse_flag("X", "0".to_string()).unwrap());
        assert!(parse_flag("X", "maybe".to_string()).is_err());
        assert_eq!(parse_bool(" YES "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.annotations.backend, StorageBackend::Sqlite);
        assert!(config.annotations.fallback_to_file);
        assert!(config.admin.password.is_none());
    }
}
