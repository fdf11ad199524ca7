//! `docverify-config` — runtime configuration.
//!
//! Provides:
//! - Typed config loaded from the environment (optionally seeded by `.env`)
//! - Fatal validation of the required secrets
//! - Secret masking for safe logging

pub mod env;
pub mod redact;

pub use env::{Config, ConfigError};
pub use redact::redact_secret;

/// Load `.env` (if present) into the process environment, then read the
/// configuration from it.
pub fn load() -> Result<Config, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read .env file"),
    }
    Config::from_env()
}
