//! Environment-backed configuration.
//!
//! `GEMINI_API_KEY` and `SESSION_SECRET` are required; every other value
//! has a default. A missing or empty required variable is a startup error.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::redact::redact_secret;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Error returned for missing or malformed configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not defined in environment variables")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// docverify runtime configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Inference API key
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Secret used to sign session cookies
    pub session_secret: String,
    /// Sessions idle longer than this are dropped
    pub session_idle: Duration,
    pub max_upload_bytes: usize,
    /// Directory with the browser frontend
    pub static_dir: PathBuf,
    /// Enables the rolling JSON log file when set
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Load configuration from a provided map (useful for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            gemini_api_key: required("GEMINI_API_KEY")?,
            session_secret: required("SESSION_SECRET")?,
            bind_address: get("DOCVERIFY_BIND").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(vars, "PORT", DEFAULT_PORT)?,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash-lite".to_string()),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            session_idle: Duration::from_secs(parse_or(
                vars,
                "DOCVERIFY_SESSION_IDLE_SECS",
                DEFAULT_SESSION_IDLE_SECS,
            )?),
            max_upload_bytes: parse_or(vars, "DOCVERIFY_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            static_dir: get("DOCVERIFY_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            log_dir: get("DOCVERIFY_LOG_DIR").map(PathBuf::from),
            log_level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// `bind_address:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_or<T: FromStr>(
    vars: &HashMap<String, String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(var).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            var,
            value: raw.to_string(),
        }),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("gemini_api_key", &redact_secret(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("session_secret", &redact_secret(&self.session_secret))
            .field("session_idle", &self.session_idle)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("static_dir", &self.static_dir)
            .field("log_dir", &self.log_dir)
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![("GEMINI_API_KEY", "AIza-test-key"), ("SESSION_SECRET", "s3cret")]
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_vars(&env(&required())).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.session_idle, Duration::from_secs(3600));
        assert_eq!(config.gemini_model, "gemini-2.5-flash-lite");
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert!(config.log_dir.is_none());
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Config::from_vars(&env(&[("SESSION_SECRET", "s3cret")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GEMINI_API_KEY")));
    }

    #[test]
    fn empty_session_secret_is_fatal() {
        let err = Config::from_vars(&env(&[("GEMINI_API_KEY", "k"), ("SESSION_SECRET", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SESSION_SECRET")));
    }

    #[test]
    fn reads_overrides() {
        let mut vars = required();
        vars.extend([("PORT", "8081"), ("DOCVERIFY_SESSION_IDLE_SECS", "60")]);
        let config = Config::from_vars(&env(&vars)).unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.session_idle, Duration::from_secs(60));
    }

    #[test]
    fn rejects_bad_numbers() {
        let mut vars = required();
        vars.push(("PORT", "eighty"));
        let err = Config::from_vars(&env(&vars)).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn debug_masks_secrets() {
        let config = Config::from_vars(&env(&required())).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("AIza-test-key"));
        assert!(!printed.contains("s3cret"));
    }
}
