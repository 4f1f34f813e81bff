use std::{env, fmt, str::FromStr, time::Duration};

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "https://api.zoom.us/v2";
const DEFAULT_TOKEN_URL: &str = "https://zoom.us/oauth/token";
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(()),
        }
    }
}

/// Upstream API endpoints and account credentials.
#[derive(Clone)]
pub struct UpstreamConfig {
    /// API base URL without a trailing slash.
    pub api_base_url: String,
    pub token_url: String,
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_base_url", &self.api_base_url)
            .field("token_url", &self.token_url)
            .field("account_id", &self.account_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Two-tier cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub redis_enabled: bool,
    pub redis_url: String,
    /// TTL applied to Redis entries.
    pub redis_ttl: Duration,
    /// TTL applied to in-process entries.
    pub memory_ttl: Duration,
    /// Capacity of the in-process store.
    pub max_entries: usize,
}

impl CacheConfig {
    /// Redis URL with any password masked, safe to log or expose.
    pub fn redis_url_redacted(&self) -> String {
        match Url::parse(&self.redis_url) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("****"));
                url.to_string()
            }
            _ => self.redis_url.clone(),
        }
    }
}

/// Per-client request quota for `/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
    /// Key clients on the first `X-Forwarded-For` hop instead of the socket peer.
    pub trust_proxy: bool,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub upstream: UpstreamConfig,
    /// Event used by the embed-code endpoint when the request names none.
    pub default_event_id: Option<String>,
    /// Public origin serving the widget.
    pub widget_domain: Url,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `port` is the bind port, used to build the default widget domain.
    pub fn from_env(port: u16) -> Result<Self, ConfigError> {
        Self::from_lookup(port, |key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a variable.
    ///
    /// Environment variables:
    /// - `UPSTREAM_ACCOUNT_ID`, `UPSTREAM_CLIENT_ID`, `UPSTREAM_CLIENT_SECRET` - required
    /// - `UPSTREAM_API_BASE_URL` - API base (default: "https://api.zoom.us/v2")
    /// - `UPSTREAM_TOKEN_URL` - token endpoint (default: "https://zoom.us/oauth/token")
    /// - `DEFAULT_EVENT_ID` - default event for embed codes (optional)
    /// - `APP_ENV` - development, production or test (default: development)
    /// - `WIDGET_DOMAIN` - widget origin (default: "http://localhost:{port}")
    /// - `REDIS_ENABLED` - enable the Redis tier (default: false)
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_TTL` - Redis TTL in seconds (default: 1800)
    /// - `CACHE_TTL_SECONDS` - memory TTL in seconds (default: 600, 1800 in production)
    /// - `CACHE_MAX_ENTRIES` - memory capacity (default: 100)
    /// - `RATE_LIMIT_WINDOW_SECONDS` - rate-limit window (default: 900)
    /// - `RATE_LIMIT_MAX` - requests per window (default: 1000, 500 in production)
    /// - `TRUST_PROXY` - trust `X-Forwarded-For` for client addresses (default: false)
    pub fn from_lookup<F>(port: u16, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |key: &'static str| {
            get(key).unwrap_or_else(|| {
                missing.push(key);
                String::new()
            })
        };
        let account_id = required("UPSTREAM_ACCOUNT_ID");
        let client_id = required("UPSTREAM_CLIENT_ID");
        let client_secret = required("UPSTREAM_CLIENT_SECRET");
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let environment = match get("APP_ENV") {
            Some(value) => value.parse().map_err(|()| ConfigError::Invalid {
                key: "APP_ENV",
                value,
            })?,
            None => Environment::default(),
        };
        let production = environment.is_production();

        let api_base_url = parse_url(
            "UPSTREAM_API_BASE_URL",
            get("UPSTREAM_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;
        let token_url = parse_url(
            "UPSTREAM_TOKEN_URL",
            get("UPSTREAM_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
        )?;
        let widget_domain = parse_url(
            "WIDGET_DOMAIN",
            get("WIDGET_DOMAIN").unwrap_or_else(|| format!("http://localhost:{port}")),
        )?;

        let memory_ttl_default = if production { 1800 } else { 600 };
        let rate_limit_default = if production { 500 } else { 1000 };

        Ok(Self {
            environment,
            upstream: UpstreamConfig {
                api_base_url: api_base_url.as_str().trim_end_matches('/').to_string(),
                token_url: token_url.to_string(),
                account_id,
                client_id,
                client_secret,
            },
            default_event_id: get("DEFAULT_EVENT_ID"),
            widget_domain,
            cache: CacheConfig {
                redis_enabled: parse_or(&get, "REDIS_ENABLED", false)?,
                redis_url: get("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
                redis_ttl: Duration::from_secs(parse_or(&get, "REDIS_TTL", 1800)?),
                memory_ttl: Duration::from_secs(parse_or(
                    &get,
                    "CACHE_TTL_SECONDS",
                    memory_ttl_default,
                )?),
                max_entries: positive(
                    "CACHE_MAX_ENTRIES",
                    parse_or(&get, "CACHE_MAX_ENTRIES", 100)?,
                )?,
            },
            rate_limit: RateLimitConfig {
                window: Duration::from_secs(positive(
                    "RATE_LIMIT_WINDOW_SECONDS",
                    parse_or(&get, "RATE_LIMIT_WINDOW_SECONDS", 900)?,
                )?),
                max_requests: positive(
                    "RATE_LIMIT_MAX",
                    parse_or(&get, "RATE_LIMIT_MAX", rate_limit_default)?,
                )?,
                trust_proxy: parse_or(&get, "TRUST_PROXY", false)?,
            },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn positive<T>(key: &'static str, value: T) -> Result<T, ConfigError>
where
    T: Default + PartialEq + ToString,
{
    if value == T::default() {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    } else {
        Ok(value)
    }
}

fn parse_url(key: &'static str, value: String) -> Result<Url, ConfigError> {
    Url::parse(&value).map_err(|_| ConfigError::Invalid { key, value })
}
