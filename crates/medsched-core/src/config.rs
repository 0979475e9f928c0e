use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8420;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Reminder scan cadence — hourly, matching the one-hour tick the rolling
/// notification window is sized for.
pub const DEFAULT_REMINDER_PERIOD_SECS: u64 = 3600;
/// Session token lifetime.
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 60;
/// Hard cap on the appointment reason text.
pub const MAX_REASON_LEN: usize = 500;

/// Top-level config (medsched.toml + MEDSCHED_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MedschedConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret for session tokens. The "change-me" default is
    /// fine for local development only.
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_reminder_period")]
    pub period_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            period_secs: DEFAULT_REMINDER_PERIOD_SECS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_token_secret() -> String {
    "change-me".to_string()
}
fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL_MINUTES
}
fn default_reminder_period() -> u64 {
    DEFAULT_REMINDER_PERIOD_SECS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.medsched/medsched.db", home)
}

impl MedschedConfig {
    /// Load config from a TOML file with MEDSCHED_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.medsched/medsched.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: MedschedConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("MEDSCHED_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.medsched/medsched.toml", home)
}
