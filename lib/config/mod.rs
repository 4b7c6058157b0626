use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::auth::{parse_scope_list, Scope};
use crate::riot_client::title::{Title, TitleConfig, TitleCredentials};

pub const ENV_PREFIX: &str = "LES_STATS_";
pub const DEFAULT_RIOT_BASE_URL: &str = "https://{routing}.api.riotgames.com";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_BATCH_SIZE: usize = 100;
const DEFAULT_DB_POOL_SIZE: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
    #[error("{title} api key is set without {var}")]
    MissingRouting { title: &'static str, var: String },
}

/// Process configuration, loaded once at start-up and passed by reference to constructors.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub db_pool_size: usize,
    pub bind_addr: SocketAddr,
    /// Provider base URL template. `{routing}` is replaced per request.
    pub riot_base_url: String,
    pub request_timeout: Duration,
    pub max_batch_size: usize,
    /// Default participant threshold for imports. 0 disables the filter.
    pub min_players: u8,
    pub tft: Option<TitleCredentials>,
    pub lol: Option<TitleCredentials>,
    pub valorant: Option<TitleCredentials>,
    pub api_keys: HashMap<String, Vec<Scope>>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source. Names are looked up with the
    /// `LES_STATS_` prefix; `DATABASE_URL` is accepted unprefixed as a fallback.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_url = var("DB_URL")
            .or_else(|| lookup("DATABASE_URL").filter(|value| !value.trim().is_empty()))
            .ok_or_else(|| ConfigError::MissingEnvVar(format!("{ENV_PREFIX}DB_URL")))?;

        let bind_addr = parse_var(
            "BIND_ADDR",
            var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;
        let request_timeout_secs: u64 = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_var("REQUEST_TIMEOUT_SECS", raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if request_timeout_secs == 0 {
            return Err(invalid("REQUEST_TIMEOUT_SECS", "must be > 0"));
        }
        let max_batch_size: usize = match var("MAX_BATCH_SIZE") {
            Some(raw) => parse_var("MAX_BATCH_SIZE", raw)?,
            None => DEFAULT_MAX_BATCH_SIZE,
        };
        if max_batch_size == 0 {
            return Err(invalid("MAX_BATCH_SIZE", "must be > 0"));
        }
        let db_pool_size: usize = match var("DB_POOL_SIZE") {
            Some(raw) => parse_var("DB_POOL_SIZE", raw)?,
            None => DEFAULT_DB_POOL_SIZE,
        };
        let min_players: u8 = match var("MIN_PLAYERS") {
            Some(raw) => parse_var("MIN_PLAYERS", raw)?,
            None => 0,
        };
        if min_players > 8 {
            return Err(invalid("MIN_PLAYERS", "must be between 0 and 8"));
        }

        let api_keys = match var("API_KEYS") {
            Some(raw) => parse_api_keys(&raw)?,
            None => HashMap::new(),
        };

        Ok(Self {
            db_url,
            db_pool_size: db_pool_size.max(1),
            bind_addr,
            riot_base_url: var("RIOT_BASE_URL").unwrap_or_else(|| DEFAULT_RIOT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(request_timeout_secs),
            max_batch_size,
            min_players,
            tft: title_credentials(&var, Title::Tft)?,
            lol: title_credentials(&var, Title::Lol)?,
            valorant: title_credentials(&var, Title::Valorant)?,
            api_keys,
        })
    }

    /// Returns the routed configuration for a title, or `None` when it has no credentials.
    pub fn title(&self, title: Title) -> Option<TitleConfig> {
        let credentials = match title {
            Title::Tft => self.tft.clone(),
            Title::Lol => self.lol.clone(),
            Title::Valorant => self.valorant.clone(),
        }?;
        Some(TitleConfig::new(title, credentials))
    }
}

fn title_credentials<F>(var: &F, title: Title) -> Result<Option<TitleCredentials>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = title.env_prefix();
    let key_var = format!("{prefix}_API_KEY");
    let routing_var = format!("{prefix}_API_ROUTING");

    match (var(&key_var), var(&routing_var)) {
        (Some(api_key), Some(routing)) => Ok(Some(TitleCredentials {
            api_key,
            routing: routing.to_ascii_lowercase(),
        })),
        (Some(_), None) => Err(ConfigError::MissingRouting {
            title: title.as_str(),
            var: format!("{ENV_PREFIX}{routing_var}"),
        }),
        (None, _) => Ok(None),
    }
}

/// Parses `key=read,write;other=read`.
fn parse_api_keys(raw: &str) -> Result<HashMap<String, Vec<Scope>>, ConfigError> {
    let mut keys = HashMap::new();
    for entry in raw.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (key, scopes) = entry
            .split_once('=')
            .ok_or_else(|| invalid("API_KEYS", format!("entry `{entry}` is not key=scopes")))?;
        let scopes = parse_scope_list(scopes).map_err(|reason| invalid("API_KEYS", reason))?;
        keys.insert(key.trim().to_string(), scopes);
    }
    Ok(keys)
}

fn parse_var<T>(name: &str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|err| invalid(name, format!("`{raw}`: {err}")))
}

fn invalid(name: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        var: format!("{ENV_PREFIX}{name}"),
        reason: reason.into(),
    }
}
