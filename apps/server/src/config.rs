//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MOSTRADOR_PORT=8080                                                │
//! │     MOSTRADOR_DB_PATH=/var/lib/mostrador/mostrador.db                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $MOSTRADOR_CONFIG, or                                              │
//! │     ~/.config/mostrador/mostrador.toml (Linux)                         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.0.0.0:3001, database in the platform data directory              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # mostrador.toml
//! bind = "127.0.0.1"
//! port = 3001
//! database_path = "/srv/mostrador/mostrador.db"
//! max_connections = 5
//! cors_origin = "http://localhost:5173"
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on
    pub bind: IpAddr,

    /// TCP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Allowed browser origin; `None` allows any origin
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3001,
            database_path: default_database_path(),
            max_connections: 5,
            cors_origin: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from defaults, the config file, then the
    /// process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::load`] with an injectable environment.
    pub fn load_with<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = env("MOSTRADOR_CONFIG")
            .map(PathBuf::from)
            .or_else(default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading server config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = env("MOSTRADOR_BIND") {
            self.bind = parse_var("MOSTRADOR_BIND", &bind)?;
        }
        if let Some(port) = env("MOSTRADOR_PORT") {
            self.port = parse_var("MOSTRADOR_PORT", &port)?;
        }
        if let Some(path) = env("MOSTRADOR_DB_PATH").filter(|p| !p.trim().is_empty()) {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }
        if let Some(max) = env("MOSTRADOR_MAX_CONNECTIONS") {
            self.max_connections = parse_var("MOSTRADOR_MAX_CONNECTIONS", &max)?;
        }
        if let Some(origin) = env("MOSTRADOR_CORS_ORIGIN") {
            self.cors_origin = Some(origin).filter(|o| !o.trim().is_empty());
        }
        Ok(())
    }

    /// Rejects configurations the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".into()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".into()));
        }
        Ok(())
    }

    /// Socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("co", "mostrador", "mostrador")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("mostrador.toml"))
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("mostrador.db"))
        .unwrap_or_else(|| PathBuf::from("mostrador.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Could not read config file: {0}")]
    Io(String),

    #[error("Could not parse config file: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3001");
        assert!(config.database_path.ends_with("mostrador.db"));
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::load_with(env_of(&[
            ("MOSTRADOR_CONFIG", "/nonexistent/mostrador.toml"),
            ("MOSTRADOR_BIND", "127.0.0.1"),
            ("MOSTRADOR_PORT", "8080"),
            ("MOSTRADOR_DB_PATH", "/tmp/tienda.db"),
            ("MOSTRADOR_CORS_ORIGIN", "http://localhost:5173"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_path, PathBuf::from("/tmp/tienda.db"));
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::load_with(env_of(&[
            ("MOSTRADOR_CONFIG", "/nonexistent/mostrador.toml"),
            ("MOSTRADOR_PORT", "tres mil"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "MOSTRADOR_PORT"));
    }

    #[test]
    fn test_toml_partial_file_keeps_defaults() {
        let config: ServerConfig = toml::from_str("port = 4000\nmax_connections = 2\n").unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.bind, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn test_zero_connections_rejected() {
        let err = ServerConfig::load_with(env_of(&[
            ("MOSTRADOR_CONFIG", "/nonexistent/mostrador.toml"),
            ("MOSTRADOR_MAX_CONNECTIONS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
