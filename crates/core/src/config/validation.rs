//! Configuration validation rules.
//!
//! Applied to `AppConfig` after it has been loaded from environment,
//! files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

/// Bucket name segments must be non-empty and free of whitespace.
fn check_name_segment(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing { field: field.into(), hint: format!("set SPRITZ_{}", field.to_uppercase()) });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(field, "must not contain whitespace"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` or `ConfigError::Missing` if:
    /// - `version_tag` or `cache_prefix` is empty or contains whitespace
    /// - `cache_prefix` ends with `-`
    /// - `origin` is not an http(s) URL
    /// - a seed asset or static prefix does not start with `/`
    /// - `timeout_ms` is outside 100ms..=5min, or `max_bytes` outside 1..=100MB
    /// - `update_interval_secs` is under a minute
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_name_segment("version_tag", &self.version_tag)?;
        check_name_segment("cache_prefix", &self.cache_prefix)?;
        if self.cache_prefix.ends_with('-') {
            return Err(invalid("cache_prefix", "must not end with '-'"));
        }

        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(invalid("origin", "must be an http or https URL"));
        }

        if let Some(seed) = self.seed_assets.iter().find(|s| !s.starts_with('/')) {
            return Err(invalid("seed_assets", format!("'{seed}' must start with '/'")));
        }
        if let Some(prefix) = self.static_prefixes.iter().find(|s| !s.starts_with('/')) {
            return Err(invalid("static_prefixes", format!("'{prefix}' must start with '/'")));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 100MB"));
        }

        if self.update_interval_secs < 60 {
            return Err(invalid("update_interval_secs", "must be at least 60 seconds"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.seed_assets.is_empty() {
            tracing::warn!("seed_assets is empty; the static bucket starts cold after install");
        }

        Ok(())
    }
}
