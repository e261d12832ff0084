use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use corae_core::ffmpeg::DEFAULT_PROBE_TIMEOUT;
use corae_core::storage::DEFAULT_UPLOADS_DIR;

/// Default upload body limit: 200 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// A malformed environment variable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Where entities are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    /// In-process store; data is lost on restart.
    Memory,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Root directory for uploaded videos.
    pub uploads_dir: PathBuf,
    /// Largest accepted request body on upload routes.
    pub max_upload_bytes: usize,
    pub probe_timeout: Duration,
    pub store: StoreBackend,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `UPLOADS_DIR`          | `instance/uploads`         |
    /// | `MAX_UPLOAD_BYTES`     | `209715200`                |
    /// | `PROBE_TIMEOUT_SECS`   | `10`                       |
    /// | `STORE`                | `postgres` (or `memory`)   |
    /// | `DATABASE_URL`         | required for `postgres`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_var(&lookup, "PORT", "u16", 3000)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", "u64", 30)?;
        let shutdown_timeout_secs = parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS", "u64", 30)?;
        let uploads_dir = lookup("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR));
        let max_upload_bytes =
            parse_var(&lookup, "MAX_UPLOAD_BYTES", "usize", DEFAULT_MAX_UPLOAD_BYTES)?;
        let probe_timeout = Duration::from_secs(parse_var(
            &lookup,
            "PROBE_TIMEOUT_SECS",
            "u64",
            DEFAULT_PROBE_TIMEOUT.as_secs(),
        )?);

        let store = match lookup("STORE").as_deref().map(str::trim) {
            Some("memory") => StoreBackend::Memory,
            None | Some("") | Some("postgres") => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE",
                    expected: "store backend (postgres or memory)",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            uploads_dir,
            max_upload_bytes,
            probe_timeout,
            store,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/corae")]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(cfg.uploads_dir, PathBuf::from("instance/uploads"));
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(cfg.probe_timeout, Duration::from_secs(10));
        assert_matches!(cfg.store, StoreBackend::Postgres { .. });
    }

    #[test]
    fn memory_store_needs_no_database() {
        let cfg = config(&[("STORE", "memory"), ("PORT", "8080")]).unwrap();
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert_matches!(config(&[]), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = config(&[("STORE", "memory"), ("PORT", "http")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { name: "PORT", .. });
        assert!(err.to_string().contains("'http'"));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let cfg = config(&[
            ("STORE", "memory"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,,"),
        ])
        .unwrap();
        assert_eq!(cfg.cors_origins, vec!["http://a.test", "http://b.test"]);
    }
}
