//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if SPRITZ_CONFIG_FILE set)
//! 3. Environment variables (SPRITZ_*)
//!
//! The version tag is the deployment surface: bumping it makes the next
//! worker create fresh buckets and prune the old ones on activation.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding buckets and records.
    ///
    /// `:memory:` selects the in-memory store. Set via SPRITZ_DB_PATH.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network timeout in milliseconds, enforced by the HTTP client.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Origin that seed paths and relative request paths resolve against.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Application prefix of every bucket name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag embedded in bucket names. Bump on every deployment.
    ///
    /// Set via SPRITZ_VERSION_TAG.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Paths fetched into the static bucket at install time.
    #[serde(default = "default_seed_assets")]
    pub seed_assets: Vec<String>,

    /// Path prefixes always treated as static assets.
    #[serde(default = "default_static_prefixes")]
    pub static_prefixes: Vec<String>,

    /// Hostname fragments of external image hosts.
    #[serde(default = "default_image_hosts")]
    pub image_hosts: Vec<String>,

    /// Seconds between update checks.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Answer to the reload prompt when a new version is ready.
    #[serde(default = "default_true")]
    pub auto_reload: bool,

    /// Keep a newly installed version waiting until the reload prompt is
    /// confirmed. By default later versions take over immediately.
    #[serde(default)]
    pub wait_for_reload: bool,

    /// Give network-first responses their own `runtime` bucket instead of
    /// sharing the static bucket.
    #[serde(default)]
    pub dedicated_runtime_bucket: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./spritz-cache.sqlite")
}

fn default_user_agent() -> String {
    "spritz/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_origin() -> String {
    "http://localhost:5173".into()
}

fn default_cache_prefix() -> String {
    "cocktail-app".into()
}

fn default_version_tag() -> String {
    "v1.0.0".into()
}

fn default_seed_assets() -> Vec<String> {
    vec!["/".into(), "/index.html".into()]
}

fn default_static_prefixes() -> Vec<String> {
    vec!["/src/".into(), "/assets/".into()]
}

fn default_image_hosts() -> Vec<String> {
    vec!["unsplash.com".into()]
}

fn default_update_interval_secs() -> u64 {
    60 * 60
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            version_tag: default_version_tag(),
            seed_assets: default_seed_assets(),
            static_prefixes: default_static_prefixes(),
            image_hosts: default_image_hosts(),
            update_interval_secs: default_update_interval_secs(),
            auto_reload: true,
            wait_for_reload: false,
            dedicated_runtime_bucket: false,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Update polling period.
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Whether the in-memory store was requested.
    pub fn in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SPRITZ_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SPRITZ_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./spritz-cache.sqlite"));
        assert_eq!(config.user_agent, "spritz/0.1");
        assert_eq!(config.cache_prefix, "cocktail-app");
        assert_eq!(config.version_tag, "v1.0.0");
        assert_eq!(config.seed_assets, vec!["/", "/index.html"]);
        assert_eq!(config.static_prefixes, vec!["/src/", "/assets/"]);
        assert_eq!(config.image_hosts, vec!["unsplash.com"]);
        assert_eq!(config.update_interval(), Duration::from_secs(3600));
        assert!(config.auto_reload);
        assert!(!config.wait_for_reload);
        assert!(!config.dedicated_runtime_bucket);
        assert!(!config.in_memory());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_in_memory_db_path() {
        let config = AppConfig { db_path: PathBuf::from(":memory:"), ..Default::default() };
        assert!(config.in_memory());
    }

    #[test]
    fn test_load_layers_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "spritz.toml",
                r#"
                version_tag = "v2.0.0"
                seed_assets = ["/", "/index.html", "/manifest.json"]
                "#,
            )?;
            jail.set_env("SPRITZ_CONFIG_FILE", "spritz.toml");
            jail.set_env("SPRITZ_CACHE_PREFIX", "bar");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.version_tag, "v2.0.0");
            assert_eq!(config.cache_prefix, "bar");
            assert_eq!(config.seed_assets.len(), 3);
            assert_eq!(config.user_agent, "spritz/0.1");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SPRITZ_VERSION_TAG", "v 2");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
