use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone)]
pub struct ExchangeConfig {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    pub base_url: String,
}

impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct ClassifierConfig {
    /// Absent key means every classification falls back.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub classifier: ClassifierConfig,
    pub http_timeout: Duration,
    pub default_leverage: f64,
    pub settle_after_close: Duration,
    pub settle_after_entry: Duration,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let exchange = ExchangeConfig {
            api_key: required("WEEX_API_KEY")?,
            secret_key: required("WEEX_SECRET_KEY")?,
            passphrase: required("WEEX_PASSPHRASE")?,
            base_url: get("WEEX_BASE_URL")
                .unwrap_or_else(|| "https://api-contract.weex.com".to_string()),
        };

        let classifier = ClassifierConfig {
            api_key: get("GROQ_API_KEY"),
            base_url: get("GROQ_BASE_URL")
                .unwrap_or_else(|| "https://api.groq.com/openai/v1".to_string()),
            model: get("GROQ_MODEL").unwrap_or_else(|| "llama-3.3-70b-versatile".to_string()),
        };

        let http_timeout_secs: u64 = parse_or(&get, "HTTP_TIMEOUT_SECS", 10)?;
        let default_leverage: f64 = parse_or(&get, "DEFAULT_LEVERAGE", 20.0)?;
        if !default_leverage.is_finite() || default_leverage <= 0.0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_LEVERAGE",
                value: default_leverage.to_string(),
            });
        }
        let settle_after_close_ms: u64 = parse_or(&get, "SETTLE_AFTER_CLOSE_MS", 2_000)?;
        let settle_after_entry_ms: u64 = parse_or(&get, "SETTLE_AFTER_ENTRY_MS", 3_000)?;

        Ok(Self {
            exchange,
            classifier,
            http_timeout: Duration::from_secs(http_timeout_secs),
            default_leverage,
            settle_after_close: Duration::from_millis(settle_after_close_ms),
            settle_after_entry: Duration::from_millis(settle_after_entry_ms),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:80".to_string()),
        })
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
