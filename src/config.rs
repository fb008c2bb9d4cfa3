use chrono::Duration;
use lazy_static::lazy_static;
use regex::Regex;
use std::env;
use std::fmt;

pub const DEFAULT_ACCESS_TOKEN_TTL: &str = "24h";
pub const DEFAULT_REFRESH_TOKEN_TTL: &str = "168h";
pub const DEFAULT_BCRYPT_COST: u32 = 12;

lazy_static! {
    // "<amount><unit>", unit one of s, m, h, d
    static ref DURATION_REGEX: Regex = Regex::new(r"^(\d+)([smhd])$").unwrap();
}

/// Settings consumed by the token service.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub bcrypt_cost: u32,
    pub auth: AuthConfig,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, treating empty values as unset
    /// for optional keys.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let database_url = optional("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        // An empty secret is passed through; the token service refuses it at construction.
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let server_port = match optional("SERVER_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                value,
            })?,
            None => 8080,
        };
        let server_host = optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let bcrypt_cost = match optional("BCRYPT_COST") {
            Some(value) => match value.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "BCRYPT_COST",
                        value,
                    })
                }
            },
            None => DEFAULT_BCRYPT_COST,
        };

        let access_token_ttl = duration_setting(
            "JWT_ACCESS_TTL",
            optional("JWT_ACCESS_TTL"),
            DEFAULT_ACCESS_TOKEN_TTL,
        )?;
        let refresh_token_ttl = duration_setting(
            "JWT_REFRESH_TTL",
            optional("JWT_REFRESH_TTL"),
            DEFAULT_REFRESH_TOKEN_TTL,
        )?;

        Ok(Self {
            database_url,
            server_port,
            server_host,
            bcrypt_cost,
            auth: AuthConfig {
                jwt_secret,
                access_token_ttl,
                refresh_token_ttl,
            },
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn duration_setting(
    key: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<Duration, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_string());
    parse_duration(&value).ok_or(ConfigError::Invalid { key, value })
}

/// Parses durations such as `90s`, `15m`, `24h` or `7d`. Zero is rejected.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let captures = DURATION_REGEX.captures(value.trim())?;
    let amount: i64 = captures[1].parse().ok()?;
    if amount == 0 {
        return None;
    }
    match &captures[2] {
        "s" => Some(Duration::seconds(amount)),
        "m" => Some(Duration::minutes(amount)),
        "h" => Some(Duration::hours(amount)),
        "d" => Some(Duration::days(amount)),
        _ => None,
    }
}
