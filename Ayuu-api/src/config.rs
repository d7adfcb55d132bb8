//! Server and desk client configuration read from the environment

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading the server configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got {0:?}")]
    InvalidPort(String),
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the SQLite database file
    pub data_dir: PathBuf,
    /// Deployment label reported by the health endpoint
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            data_dir: PathBuf::from("data"),
            environment: "development".to_string(),
        }
    }
}

impl ServerConfig {
    /// Read `PORT`, `DATA_DIR` and `APP_ENV`, falling back to the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or(ConfigError::InvalidPort(value))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            port,
            data_dir: env::var("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            environment: env::var("APP_ENV").unwrap_or(defaults.environment),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
    }

    /// Default SQLite file when `DB_SQLITE_PATH` is not set
    pub fn default_sqlite_path(&self) -> PathBuf {
        self.data_dir.join("ayuu.db")
    }
}

/// Desk client settings
#[derive(Debug, Clone, PartialEq)]
pub struct DeskConfig {
    /// Base URL of the API server
    pub api_url: String,
    /// File holding the signed-in user
    pub session_file: PathBuf,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            session_file: PathBuf::from("data").join("session.json"),
        }
    }
}

impl DeskConfig {
    /// Read `AYUU_API_URL` and `SESSION_FILE`, falling back to the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("AYUU_API_URL").unwrap_or(defaults.api_url),
            session_file: env::var("SESSION_FILE").map(PathBuf::from).unwrap_or(defaults.session_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().port(), 3000);
        assert_eq!(config.default_sqlite_path(), PathBuf::from("data").join("ayuu.db"));

        let desk = DeskConfig::default();
        assert_eq!(desk.api_url, "http://localhost:3000");
        assert_eq!(desk.session_file, PathBuf::from("data").join("session.json"));
    }
}
