//! Configuration loading for the tezlik service.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `TEZLIK_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Application configuration derived from `TEZLIK_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// Bearer tokens accepted for administrative endpoints (bulk issue resolve).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator_tokens: Vec<String>,
    /// Server-side key for password hashing. Must be set to a real secret
    /// outside the dev profile.
    #[serde(default = "default_auth_secret")]
    pub auth_secret: String,
    #[serde(default)]
    pub geo: GeoConfig,
}

/// Geolocation lookup configuration.
///
/// Base URLs are overridable so tests can point the fallback chain at a
/// local mock server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GeoConfig {
    #[serde(default = "default_geo_ipapi_base")]
    pub ipapi_base: String,
    #[serde(default = "default_geo_ip_api_base")]
    pub ip_api_base: String,
    #[serde(default = "default_geo_ipwhois_base")]
    pub ipwhois_base: String,
    /// Per-provider request timeout in milliseconds.
    #[serde(default = "default_geo_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            ipapi_base: default_geo_ipapi_base(),
            ip_api_base: default_geo_ip_api_base(),
            ipwhois_base: default_geo_ipwhois_base(),
            timeout_ms: default_geo_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            operator_tokens: Vec::new(),
            auth_secret: default_auth_secret(),
            geo: GeoConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse the configured bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Serialize the configuration with secrets removed, for startup logging.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut redacted = self.clone();
        redacted.operator_tokens = redacted
            .operator_tokens
            .iter()
            .map(|_| "<redacted>".to_string())
            .collect();
        redacted.auth_secret = "<redacted>".to_string();
        serde_json::to_string(&redacted)
    }

    /// Validate numeric bounds and the bind address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidDbMaxConnections {
                value: self.db_max_connections,
            });
        }
        if self.geo.timeout_ms == 0 || self.geo.timeout_ms > 60_000 {
            return Err(ConfigError::InvalidGeoTimeout {
                value: self.geo.timeout_ms,
            });
        }
        self.bind_addr()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: self.api_bind_addr.clone(),
                source,
            })?;
        Ok(())
    }
}

fn default_profile() -> String {
    "dev".to_string()
}

fn default_api_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5_000
}

fn default_auth_secret() -> String {
    "tezlik-dev-secret".to_string()
}

fn default_geo_ipapi_base() -> String {
    "https://ipapi.co".to_string()
}

fn default_geo_ip_api_base() -> String {
    "http://ip-api.com".to_string()
}

fn default_geo_ipwhois_base() -> String {
    "https://ipwhois.app".to_string()
}

fn default_geo_timeout_ms() -> u64 {
    5_000
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("db max connections must be positive, got {value}")]
    InvalidDbMaxConnections { value: u32 },
    #[error("geo lookup timeout must be between 1 and 60000 ms, got {value}")]
    InvalidGeoTimeout { value: u64 },
}

/// Loads configuration using layered `.env` files and `TEZLIK_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads configuration, with process environment taking precedence over
    /// profile env files, which take precedence over `.env`.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("TEZLIK_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);
        let db_max_connections = layered
            .remove("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = layered
            .remove("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);

        // Operator tokens: single token or comma-separated list.
        let operator_tokens = if let Some(tokens) = layered.remove("OPERATOR_TOKENS") {
            tokens
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        } else if let Some(token) = layered.remove("OPERATOR_TOKEN") {
            vec![token]
        } else {
            Vec::new()
        };

        let auth_secret = layered
            .remove("AUTH_SECRET")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_auth_secret);

        let geo = GeoConfig {
            ipapi_base: layered
                .remove("GEO_IPAPI_BASE")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_geo_ipapi_base),
            ip_api_base: layered
                .remove("GEO_IP_API_BASE")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_geo_ip_api_base),
            ipwhois_base: layered
                .remove("GEO_IPWHOIS_BASE")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_geo_ipwhois_base),
            timeout_ms: layered
                .remove("GEO_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_geo_timeout_ms),
        };

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            operator_tokens,
            auth_secret,
            geo,
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("TEZLIK_PROFILE")
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix("TEZLIK_") {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.profile, "dev");
        assert!(config.bind_addr().is_ok());
    }

    #[test]
    fn redacted_json_hides_secrets() {
        let config = AppConfig {
            operator_tokens: vec!["super-secret".to_string()],
            auth_secret: "another-secret".to_string(),
            ..Default::default()
        };
        let json = config.redacted_json().unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("another-secret"));
        assert!(json.contains("<redacted>"));
    }

    #[test]
    fn validate_rejects_zero_geo_timeout() {
        let mut config = AppConfig::default();
        config.geo.timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGeoTimeout { value: 0 })
        ));
    }

    #[test]
    fn validate_rejects_bad_bind_addr() {
        let config = AppConfig {
            api_bind_addr: "not-an-addr".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
    }
}
