//! Runtime configuration, read from environment variables (an optional `.env`
//! file is loaded first by `main`).

use std::net::SocketAddr;

use thiserror::Error;
use tracing::Level;
use url::Url;

use crate::resolver::RANDOM_TOPIC_LABEL;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("{name} can't be parsed: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("NGROK_URL and NGROK_ADDR must be set together")]
    IncompleteWebhook,
}

/// Public URL and local bind address of the update webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub teloxide_token: String,
    pub log_level: Level,
    pub webhook: Option<Webhook>,
    pub api_addr: Option<SocketAddr>,
    pub random_topic_label: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let log_level = parse_optional(&lookup, "LOG_LEVEL", |v| v.parse::<Level>())?
            .unwrap_or(Level::INFO);

        let ngrok_url = parse_optional(&lookup, "NGROK_URL", |v| v.parse::<Url>())?;
        let ngrok_addr = parse_optional(&lookup, "NGROK_ADDR", |v| v.parse::<SocketAddr>())?;
        let webhook = match (ngrok_url, ngrok_addr) {
            (Some(url), Some(addr)) => Some(Webhook { url, addr }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteWebhook),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            teloxide_token: required("TELOXIDE_TOKEN")?,
            log_level,
            webhook,
            api_addr: parse_optional(&lookup, "API_ADDR", |v| v.parse::<SocketAddr>())?,
            random_topic_label: lookup("RANDOM_TOPIC_LABEL")
                .map(|label| label.trim().to_owned())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| RANDOM_TOPIC_LABEL.to_owned()),
        })
    }
}

fn parse_optional<F, T, E, P>(lookup: &F, name: &'static str, parse: P) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    E: std::fmt::Display,
    P: Fn(&str) -> Result<T, E>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => parse(value.trim())
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}
