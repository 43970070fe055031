//! Process configuration parsed from environment variables.
//!
//! Loaded once in `main` (after `dotenvy` has populated the environment)
//! and treated as read-only afterwards.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_VK_API_BASE: &str = "https://api.vk.com/method";
pub const DEFAULT_LONGPOLL_WAIT_SECS: u64 = 25;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Slack added to the long-poll wait to get the default request timeout.
pub const REQUEST_TIMEOUT_SLACK_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "E_CONFIG_MISSING",
            Self::Invalid { .. } => "E_CONFIG_INVALID",
        }
    }
}

/// Community bot credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub group_id: i64,
    /// Long-lived community access token.
    pub token: String,
}

/// Relay tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VkConfig {
    pub api_base: String,
    pub wait_secs: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_VK_API_BASE.to_string(),
            wait_secs: DEFAULT_LONGPOLL_WAIT_SECS,
            request_timeout_secs: DEFAULT_LONGPOLL_WAIT_SECS + REQUEST_TIMEOUT_SLACK_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
        }
    }
}

/// Bootstrap admin account, created at startup when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub bot: BotConfig,
    pub vk: VkConfig,
    pub admin: Option<AdminConfig>,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`
    /// - `BOT_GROUP_ID` (integer)
    /// - `BOT_TOKEN`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DB_MAX_CONNECTIONS`: default 5, must be at least 1
    /// - `VK_API_BASE`: default `https://api.vk.com/method`
    /// - `VK_LONGPOLL_WAIT`: default 25
    /// - `VK_REQUEST_TIMEOUT_SECS`: default wait + 10
    /// - `VK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `VK_BACKOFF_BASE_MS` / `VK_BACKOFF_MAX_MS`: default 500 / 30000
    /// - `ADMIN_EMAIL` + `ADMIN_PASSWORD`: bootstrap admin, both or neither
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required var is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let db_max_connections = parsed("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid { var: "DB_MAX_CONNECTIONS", value: "0".into() });
        }
        let port = parsed("PORT", DEFAULT_PORT)?;

        let bot = BotConfig {
            group_id: parse_value("BOT_GROUP_ID", &required("BOT_GROUP_ID")?)?,
            token: required("BOT_TOKEN")?,
        };

        let wait_secs = parsed("VK_LONGPOLL_WAIT", DEFAULT_LONGPOLL_WAIT_SECS)?;
        let vk = VkConfig {
            api_base: std::env::var("VK_API_BASE")
                .unwrap_or_else(|_| DEFAULT_VK_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            wait_secs,
            request_timeout_secs: parsed("VK_REQUEST_TIMEOUT_SECS", wait_secs + REQUEST_TIMEOUT_SLACK_SECS)?,
            connect_timeout_secs: parsed("VK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            backoff_base_ms: parsed("VK_BACKOFF_BASE_MS", DEFAULT_BACKOFF_BASE_MS)?,
            backoff_max_ms: parsed("VK_BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS)?,
        };

        let admin = match (std::env::var("ADMIN_EMAIL").ok(), std::env::var("ADMIN_PASSWORD").ok()) {
            (Some(email), Some(password)) => Some(AdminConfig { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        Ok(Self { database_url, db_max_connections, port, bot, vk, admin })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parsed<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => parse_value(var, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { var, value: raw.to_string() })
}

/// Parse a boolean flag like `COOKIE_SECURE`.
pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
