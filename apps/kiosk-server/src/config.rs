//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KIOSK_PORT=8080                                                    │
//! │     KIOSK_RESEND_API_KEY=re_...   (RESEND_API_KEY also accepted)       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $KIOSK_CONFIG, else ./kiosk.toml                                   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     port 8080, database in the platform data dir                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # kiosk.toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//! cors_origin = "*"
//!
//! [database]
//! path = "/var/lib/matcha-kiosk/kiosk.db"
//!
//! [auth]
//! jwt_secret = "change-me"
//! token_lifetime_secs = 43200
//!
//! [business]
//! utc_offset_minutes = -300
//! currency_symbol = "$"
//!
//! [resend]
//! api_key = "re_..."
//! recipients = ["owner@matcha.cafe"]
//!
//! [posthog]
//! api_key = "phx_..."
//! project_id = "319238"
//! ```

use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use kiosk_core::reports::BusinessDay;

const DEV_JWT_SECRET: &str = "matcha-kiosk-dev-secret-change-in-production";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `*` allows any origin.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

/// `<data dir>/kiosk.db`, or `./kiosk.db` when the platform has no data dir.
fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("cafe", "matcha", "kiosk")
        .map(|dirs| dirs.data_dir().join("kiosk.db"))
        .unwrap_or_else(|| PathBuf::from("kiosk.db"))
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Admin access token lifetime. Default: 12 hours (one shift).
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: i64,
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_lifetime() -> i64 {
    12 * 60 * 60
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: default_jwt_secret(),
            token_lifetime_secs: default_token_lifetime(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSettings {
    /// Offset of the café's wall clock from UTC; decides where "today" starts.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for BusinessSettings {
    fn default() -> Self {
        BusinessSettings {
            utc_offset_minutes: 0,
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Email provider for the daily summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResendSettings {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_resend_base_url")]
    pub base_url: String,

    #[serde(default = "default_sender")]
    pub from: String,

    #[serde(default)]
    pub recipients: Vec<String>,
}

fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_sender() -> String {
    "Matcha Chá <onboarding@resend.dev>".to_string()
}

impl Default for ResendSettings {
    fn default() -> Self {
        ResendSettings {
            api_key: None,
            base_url: default_resend_base_url(),
            from: default_sender(),
            recipients: Vec::new(),
        }
    }
}

/// Analytics provider for the metrics proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostHogSettings {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_posthog_base_url")]
    pub base_url: String,

    #[serde(default = "default_project_id")]
    pub project_id: String,
}

fn default_posthog_base_url() -> String {
    "https://us.posthog.com".to_string()
}

fn default_project_id() -> String {
    "319238".to_string()
}

impl Default for PostHogSettings {
    fn default() -> Self {
        PostHogSettings {
            api_key: None,
            base_url: default_posthog_base_url(),
            project_id: default_project_id(),
        }
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub business: BusinessSettings,

    #[serde(default)]
    pub resend: ResendSettings,

    #[serde(default)]
    pub posthog: PostHogSettings,
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`$KIOSK_CONFIG` or `./kiosk.toml`)
    /// 3. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var("KIOSK_CONFIG").ok().map(PathBuf::from);
        let path = explicit.clone().unwrap_or_else(|| PathBuf::from("kiosk.toml"));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            if explicit.is_some() {
                return Err(ConfigError::FileNotFound(path));
            }
            debug!(?path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        if config.auth.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set KIOSK_JWT_SECRET in production");
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading server config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `KIOSK_*` overrides read through `lookup`.
    ///
    /// Taking the lookup as a closure keeps tests off the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("KIOSK_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("KIOSK_PORT") {
            self.server.port = parse_value("KIOSK_PORT", &port)?;
        }
        if let Some(origin) = lookup("KIOSK_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Some(path) = lookup("KIOSK_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(secret) = lookup("KIOSK_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(lifetime) = lookup("KIOSK_TOKEN_LIFETIME_SECS") {
            self.auth.token_lifetime_secs = parse_value("KIOSK_TOKEN_LIFETIME_SECS", &lifetime)?;
        }
        if let Some(offset) = lookup("KIOSK_UTC_OFFSET_MINUTES") {
            self.business.utc_offset_minutes = parse_value("KIOSK_UTC_OFFSET_MINUTES", &offset)?;
        }
        if let Some(symbol) = lookup("KIOSK_CURRENCY_SYMBOL") {
            self.business.currency_symbol = symbol;
        }

        if let Some(key) = lookup("KIOSK_RESEND_API_KEY").or_else(|| lookup("RESEND_API_KEY")) {
            self.resend.api_key = Some(key);
        }
        if let Some(url) = lookup("KIOSK_RESEND_BASE_URL") {
            self.resend.base_url = url;
        }
        if let Some(from) = lookup("KIOSK_RESEND_FROM") {
            self.resend.from = from;
        }
        if let Some(recipients) = lookup("KIOSK_RESEND_RECIPIENTS") {
            self.resend.recipients = recipients
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(key) = lookup("KIOSK_POSTHOG_API_KEY").or_else(|| lookup("POSTHOG_API_KEY")) {
            self.posthog.api_key = Some(key);
        }
        if let Some(url) = lookup("KIOSK_POSTHOG_BASE_URL") {
            self.posthog.base_url = url;
        }
        if let Some(project) = lookup("KIOSK_POSTHOG_PROJECT_ID") {
            self.posthog.project_id = project;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("auth.token_lifetime_secs".to_string()));
        }
        if BusinessDay::from_offset_minutes(self.business.utc_offset_minutes).is_err() {
            return Err(ConfigError::InvalidValue("business.utc_offset_minutes".to_string()));
        }
        if self.server.cors_origin != "*" && HeaderValue::from_str(&self.server.cors_origin).is_err() {
            return Err(ConfigError::InvalidValue("server.cors_origin".to_string()));
        }
        for (name, url) in [
            ("resend.base_url", &self.resend.base_url),
            ("posthog.base_url", &self.posthog.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(name.to_string()));
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }

    /// Business-day boundaries for the configured offset.
    pub fn business_day(&self) -> BusinessDay {
        BusinessDay::from_offset_minutes(self.business.utc_offset_minutes).unwrap_or_default()
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
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
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.server.cors_origin, "*");
        assert_eq!(config.resend.base_url, "https://api.resend.com");
        assert_eq!(config.posthog.project_id, "319238");
        assert!(config.resend.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_with_partial_sections() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [business]
            utc_offset_minutes = -300

            [resend]
            recipients = ["owner@matcha.cafe"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.business.utc_offset_minutes, -300);
        assert_eq!(config.business.currency_symbol, "$");
        assert_eq!(config.resend.recipients, vec!["owner@matcha.cafe"]);
        assert_eq!(config.resend.from, "Matcha Chá <onboarding@resend.dev>");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: ServerConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        config
            .apply_env_overrides(env(&[
                ("KIOSK_PORT", "7000"),
                ("RESEND_API_KEY", "re_legacy"),
                ("KIOSK_RESEND_RECIPIENTS", "a@matcha.cafe, b@matcha.cafe,"),
                ("KIOSK_POSTHOG_API_KEY", "phx_test"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.resend.api_key.as_deref(), Some("re_legacy"));
        assert_eq!(config.resend.recipients, vec!["a@matcha.cafe", "b@matcha.cafe"]);
        assert_eq!(config.posthog.api_key.as_deref(), Some("phx_test"));
    }

    #[test]
    fn test_prefixed_key_wins_over_legacy_name() {
        let mut config = ServerConfig::default();
        config
            .apply_env_overrides(env(&[("KIOSK_RESEND_API_KEY", "re_new"), ("RESEND_API_KEY", "re_old")]))
            .unwrap();
        assert_eq!(config.resend.api_key.as_deref(), Some("re_new"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env_overrides(env(&[("KIOSK_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == "KIOSK_PORT"));

        let mut config = ServerConfig::default();
        config.business.utc_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.auth.jwt_secret = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));

        let mut config = ServerConfig::default();
        config.posthog.base_url = "us.posthog.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_business_day_follows_offset() {
        let mut config = ServerConfig::default();
        config.business.utc_offset_minutes = 120;
        assert_eq!(config.business_day().offset().local_minus_utc(), 7200);
    }
}
