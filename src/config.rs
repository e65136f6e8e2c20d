use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} missing!")]
    Missing(&'static str),
    #[error("{key} has an invalid value {value:?}: expected a number of seconds, at least {min}")]
    Invalid {
        key: &'static str,
        value: String,
        min: u64,
    },
}

/// Which entry point the configuration is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Reply with the deep link as text
    Reply,
    /// Shorten the link, re-send the media, delete the original
    Relay,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    /// Present only for [`Variant::Relay`]
    pub shortener: Option<ShortenerConfig>,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Public username without the leading `@`
    pub bot_username: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ShortenerConfig {
    pub api_key: String,
    pub api_url: String,
    pub timeout: Duration,
}

fn default_shortener_api_url() -> String {
    "https://viralbox.in/api".to_string()
}

fn default_shortener_timeout() -> Duration {
    Duration::from_secs(15)
}

/// `getUpdates` long-polls for 10 seconds; the client must wait longer than that.
const MIN_TELEGRAM_TIMEOUT_SECS: u64 = 11;

fn default_telegram_timeout() -> Duration {
    Duration::from_secs(20)
}

impl Config {
    /// Load from the process environment, honouring a `.env` file if one exists.
    pub fn from_env(variant: Variant) -> Result<Self, ConfigError> {
        // A missing .env is fine; the variables may come from the real environment.
        let _ = dotenvy::dotenv();
        Self::from_lookup(variant, |key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values count as missing.
    pub fn from_lookup<F>(variant: Variant, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let seconds = |key: &'static str, default: Duration, min: u64| match get(key) {
            None => Ok(default),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs >= min => Ok(Duration::from_secs(secs)),
                _ => Err(ConfigError::Invalid {
                    key,
                    value: raw,
                    min,
                }),
            },
        };

        let bot_token = require("BOT_TOKEN")?;
        let bot_username = require("BOT_USERNAME")?.trim_start_matches('@').to_string();
        if bot_username.is_empty() {
            return Err(ConfigError::Missing("BOT_USERNAME"));
        }

        let telegram = TelegramConfig {
            bot_token,
            bot_username,
            timeout: seconds(
                "TELEGRAM_TIMEOUT_SECS",
                default_telegram_timeout(),
                MIN_TELEGRAM_TIMEOUT_SECS,
            )?,
        };

        let shortener = match variant {
            Variant::Reply => None,
            Variant::Relay => Some(ShortenerConfig {
                api_key: require("VIRALBOX_API_KEY")?,
                api_url: get("SHORTENER_API_URL").unwrap_or_else(default_shortener_api_url),
                timeout: seconds("SHORTENER_TIMEOUT_SECS", default_shortener_timeout(), 1)?,
            }),
        };

        Ok(Config {
            telegram,
            shortener,
        })
    }
}
