//! # Register Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (later overrides earlier)
//! 1. Defaults (this file)
//! 2. Config file (`register.toml` in the platform config directory, or an
//!    explicit path)
//! 3. Environment variables (`TALLY_*`)
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml
//! [store]
//! tenant_id = "store-42"
//! name = "Corner Mart"
//! currency_symbol = "₹"
//!
//! [backend]
//! api_url = "https://billing.example.com/api"
//! request_timeout_secs = 10
//!
//! [scanner]
//! interval_ms = 250
//! capture_file = "/run/tally/scan.txt"
//! ```
//!
//! Configuration is read-only after startup, so no lock is needed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use tally_client::BackendConfig;
use tally_core::Money;

/// Tenant used when nothing is configured (single-store development).
pub const DEFAULT_TENANT_ID: &str = "default";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Which store this register bills for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,

    /// Shown in the console banner.
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_tenant_id() -> String {
    DEFAULT_TENANT_ID.to_string()
}

fn default_store_name() -> String {
    "Tally Dev Store".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            tenant_id: default_tenant_id(),
            name: default_store_name(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Where the billing backend lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Camera scanner polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerSettings {
    #[serde(default = "default_scan_interval")]
    pub interval_ms: u64,

    /// File an external barcode decoder writes codes to.
    #[serde(default)]
    pub capture_file: Option<PathBuf>,
}

fn default_scan_interval() -> u64 {
    250
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            interval_ms: default_scan_interval(),
            capture_file: None,
        }
    }
}

// =============================================================================
// Register Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.tenant_id.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant_id must not be empty".into()));
        }

        let url = &self.backend.api_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "API URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.scanner.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scanner interval_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tenant_id) = lookup("TALLY_TENANT_ID") {
            debug!(tenant_id = %tenant_id, "Overriding tenant from environment");
            self.store.tenant_id = tenant_id;
        }

        if let Some(url) = lookup("TALLY_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.backend.api_url = url;
        }

        if let Some(name) = lookup("TALLY_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(symbol) = lookup("TALLY_CURRENCY_SYMBOL") {
            self.store.currency_symbol = symbol;
        }

        if let Some(timeout) = lookup("TALLY_REQUEST_TIMEOUT_SECS") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => self.backend.request_timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid TALLY_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Some(interval) = lookup("TALLY_SCAN_INTERVAL_MS") {
            match interval.trim().parse::<u64>() {
                Ok(ms) => self.scanner.interval_ms = ms,
                Err(_) => warn!(value = %interval, "Ignoring invalid TALLY_SCAN_INTERVAL_MS"),
            }
        }

        if let Some(path) = lookup("TALLY_SCAN_FILE") {
            self.scanner.capture_file = Some(PathBuf::from(path));
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "register")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tenant_id(&self) -> &str {
        &self.store.tenant_id
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scanner.interval_ms)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.backend.api_url.clone(),
            tenant_id: self.store.tenant_id.clone(),
            timeout: Duration::from_secs(self.backend.request_timeout_secs),
        }
    }

    /// Formats an amount with the configured symbol and two decimals.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::Money;
    /// use tally_register::config::RegisterConfig;
    ///
    /// let config = RegisterConfig::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let magnitude = Money::from_cents(amount.cents().saturating_abs());
        format!("{}{}{}", sign, self.store.currency_symbol, magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RegisterConfig::default();
        assert_eq!(config.tenant_id(), DEFAULT_TENANT_ID);
        assert_eq!(config.scan_interval(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_sections_partial() {
        let config: RegisterConfig = toml::from_str(
            r#"
            [store]
            tenant_id = "store-42"

            [backend]
            api_url = "https://billing.example.com/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.tenant_id(), "store-42");
        assert_eq!(config.store.currency_symbol, "$");
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert_eq!(config.scanner.interval_ms, 250);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RegisterConfig::default();
        config.apply_env_overrides(env(&[
            ("TALLY_TENANT_ID", "store-7"),
            ("TALLY_API_URL", "https://api.example.com"),
            ("TALLY_CURRENCY_SYMBOL", "₹"),
            ("TALLY_REQUEST_TIMEOUT_SECS", "3"),
            ("TALLY_SCAN_INTERVAL_MS", "not-a-number"),
        ]));

        assert_eq!(config.tenant_id(), "store-7");
        assert_eq!(config.backend.api_url, "https://api.example.com");
        assert_eq!(config.store.currency_symbol, "₹");
        assert_eq!(config.backend.request_timeout_secs, 3);
        assert_eq!(config.scanner.interval_ms, 250);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RegisterConfig::default();

        config.store.tenant_id = "  ".to_string();
        assert!(config.validate().is_err());
        config.store.tenant_id = "t".to_string();

        config.backend.api_url = "ws://localhost".to_string();
        assert!(config.validate().is_err());
        config.backend.api_url = "http://localhost".to_string();

        config.backend.request_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.backend.request_timeout_secs = 1;

        config.scanner.interval_ms = 0;
        assert!(config.validate().is_err());
        config.scanner.interval_ms = 1;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("tally-register-does-not-exist.toml");
        let config = RegisterConfig::load_or_default(Some(path));
        assert_eq!(config.store.name, "Tally Dev Store");
    }

    #[test]
    fn test_format_currency() {
        let config = RegisterConfig::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
        assert_eq!(config.format_currency(Money::from_cents(1)), "$0.01");
        assert_eq!(config.format_currency(Money::zero()), "$0.00");
        assert_eq!(config.format_currency(Money::from_cents(-1234)), "-$12.34");
    }
}
