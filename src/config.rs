use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_BREVO_API_URL: &str = "https://api.brevo.com/v3";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    /// Shared secret expected as `Authorization: Bearer <key>` on intake.
    pub api_key: String,
    pub telegram_bot_token: String,
    pub telegram_admin_chat_id: i64,
    pub telegram_api_url: String,
    pub brevo_api_key: String,
    pub brevo_list_id: i64,
    pub brevo_api_url: String,
    pub http_timeout_secs: u64,
    pub public_rps: u32,
    /// Public base URL of this service; when set the Telegram webhook is
    /// registered against `{base}/api/telegram/webhook` at startup.
    pub webhook_base_url: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            api_key: get_env("API_KEY")?,
            telegram_bot_token: get_env("TELEGRAM_BOT_TOKEN")?,
            telegram_admin_chat_id: get_env_parse("TELEGRAM_ADMIN_CHAT_ID")?,
            telegram_api_url: get_env_or("TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL),
            brevo_api_key: get_env("BREVO_API_KEY")?,
            brevo_list_id: get_env_parse("BREVO_LIST_ID")?,
            brevo_api_url: get_env_or("BREVO_API_URL", DEFAULT_BREVO_API_URL),
            http_timeout_secs: get_env_parse_or("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            webhook_base_url: env::var("WEBHOOK_BASE_URL")
                .ok()
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|| default.to_string())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        _ => Ok(default),
    }
}

pub fn init_config() -> Result<&'static Config> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    get_config()
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
