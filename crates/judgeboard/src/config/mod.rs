use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::scoring::DEFAULT_STORAGE_KEY;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DATA_DIR: &str = "data";

/// Deployment stage, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Log line layout, read from `APP_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single line per event without the module target.
    #[default]
    Compact,
    /// Default `tracing-subscriber` layout, target included.
    Full,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Reads `.env` when present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable source; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("APP_ENV")
            .map(|raw| AppEnvironment::parse(&raw))
            .unwrap_or(AppEnvironment::Development);

        let port = match lookup("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        };

        let telemetry = TelemetryConfig {
            log_level: lookup("APP_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            format: lookup("APP_LOG_FORMAT")
                .map(|raw| LogFormat::parse(&raw))
                .transpose()?
                .unwrap_or_default(),
        };

        let key = lookup("JUDGEBOARD_STORAGE_KEY").unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        let storage = StorageConfig {
            data_dir: lookup("JUDGEBOARD_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            key,
        };

        Ok(Self {
            environment,
            server,
            telemetry,
            storage,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `localhost` maps to the IPv4 loopback; anything else must be a literal address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost {
                    host: self.host.clone(),
                    source,
                })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Where the judging snapshot lives between runs.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub key: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidHost {
        host: String,
        source: std::net::AddrParseError,
    },
    InvalidLogFormat(String),
    EmptyStorageKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(raw) => write!(f, "APP_PORT '{raw}' is not a valid port"),
            ConfigError::InvalidHost { host, .. } => {
                write!(f, "APP_HOST '{host}' is not an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(raw) => {
                write!(f, "APP_LOG_FORMAT '{raw}' must be 'compact' or 'full'")
            }
            ConfigError::EmptyStorageKey => write!(f, "JUDGEBOARD_STORAGE_KEY must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source, .. } => Some(source),
            ConfigError::InvalidPort(_)
            | ConfigError::InvalidLogFormat(_)
            | ConfigError::EmptyStorageKey => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.storage.key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn localhost_resolves_to_loopback() {
        let config = config_from(&[("APP_HOST", "localhost"), ("APP_PORT", "8080")])
            .expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8080));
    }

    #[test]
    fn hostnames_other_than_localhost_are_rejected() {
        let config = config_from(&[("APP_HOST", "judging.local")]).expect("config loads");
        let err = config.server.socket_addr().expect_err("not an address");
        assert!(err.to_string().contains("judging.local"));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = config_from(&[("APP_PORT", "eighty")]).expect_err("port must be numeric");
        assert!(matches!(err, ConfigError::InvalidPort(ref raw) if raw == "eighty"));
    }

    #[test]
    fn storage_and_logging_overrides() {
        let config = config_from(&[
            ("APP_ENV", "prod"),
            ("APP_LOG_FORMAT", "FULL"),
            ("JUDGEBOARD_DATA_DIR", "/var/lib/judgeboard"),
            ("JUDGEBOARD_STORAGE_KEY", "finals-2025"),
        ])
        .expect("config loads");

        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.telemetry.format, LogFormat::Full);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/judgeboard"));
        assert_eq!(config.storage.key, "finals-2025");
    }

    #[test]
    fn blank_storage_key_and_unknown_format_fail() {
        let blank = config_from(&[("JUDGEBOARD_STORAGE_KEY", "  ")]);
        assert!(matches!(blank, Err(ConfigError::EmptyStorageKey)));

        let format = config_from(&[("APP_LOG_FORMAT", "xml")]);
        assert!(matches!(format, Err(ConfigError::InvalidLogFormat(_))));
    }

    #[test]
    fn load_reads_process_environment() {
        env::set_var("JUDGEBOARD_STORAGE_KEY", "from-env");
        let loaded = AppConfig::load();
        env::remove_var("JUDGEBOARD_STORAGE_KEY");

        assert_eq!(loaded.expect("config loads").storage.key, "from-env");
    }
}
