//! Client configuration parsed from environment variables.

use std::time::Duration;
use thiserror::Error;

pub const ENV_API_URL: &str = "AUDIOGUIDE_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AUDIOGUIDE_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "AUDIOGUIDE_CONNECT_TIMEOUT_SECS";
pub const ENV_TOKEN_STORE: &str = "AUDIOGUIDE_TOKEN_STORE";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    Missing { var: String },
    #[error("invalid value for {var}: {value}")]
    Invalid { var: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStoreKind {
    /// The store plugin file in the app data directory.
    App,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl ClientTimeouts {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Guide API base URL without a trailing slash.
    pub api_url: String,
    pub timeouts: ClientTimeouts,
    pub token_store: TokenStoreKind,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim().trim_end_matches('/').to_string(),
            timeouts: ClientTimeouts::default(),
            token_store: TokenStoreKind::App,
        }
    }

    /// Build typed client config from environment variables.
    ///
    /// Required:
    /// - `AUDIOGUIDE_API_URL`: http(s) base URL of the guide API
    ///
    /// Optional:
    /// - `AUDIOGUIDE_REQUEST_TIMEOUT_SECS`: default 15
    /// - `AUDIOGUIDE_CONNECT_TIMEOUT_SECS`: default 5
    /// - `AUDIOGUIDE_TOKEN_STORE`: `app` (default), `keyring` or `memory`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw_url = lookup(ENV_API_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                var: ENV_API_URL.into(),
            })?;
        let parsed = reqwest::Url::parse(&raw_url).map_err(|_| ConfigError::Invalid {
            var: ENV_API_URL.into(),
            value: raw_url.clone(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: ENV_API_URL.into(),
                value: raw_url,
            });
        }

        let timeouts = ClientTimeouts {
            request_secs: parse_secs(&lookup, ENV_REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_secs(&lookup, ENV_CONNECT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let token_store = parse_token_store(lookup(ENV_TOKEN_STORE).as_deref())?;

        Ok(Self {
            timeouts,
            token_store,
            ..Self::new(raw_url)
        })
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::Invalid {
            var: var.into(),
            value: raw,
        }),
    }
}

fn parse_token_store(raw: Option<&str>) -> Result<TokenStoreKind, ConfigError> {
    match raw.map(str::trim).unwrap_or("app") {
        "" | "app" => Ok(TokenStoreKind::App),
        "keyring" => Ok(TokenStoreKind::Keyring),
        "memory" => Ok(TokenStoreKind::Memory),
        other => Err(ConfigError::Invalid {
            var: ENV_TOKEN_STORE.into(),
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_applies_defaults() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[(ENV_API_URL, "https://guide.example/api/")]))
                .unwrap();
        assert_eq!(config.api_url, "https://guide.example/api");
        assert_eq!(config.timeouts, ClientTimeouts::default());
        assert_eq!(config.token_store, TokenStoreKind::App);
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "http://localhost:8080"),
            (ENV_REQUEST_TIMEOUT_SECS, "30"),
            (ENV_CONNECT_TIMEOUT_SECS, " 2 "),
            (ENV_TOKEN_STORE, "keyring"),
        ]))
        .unwrap();
        assert_eq!(config.timeouts.request(), Duration::from_secs(30));
        assert_eq!(config.timeouts.connect(), Duration::from_secs(2));
        assert_eq!(config.token_store, TokenStoreKind::Keyring);
    }

    #[test]
    fn from_lookup_requires_api_url() {
        assert_eq!(
            ClientConfig::from_lookup(lookup_from(&[])),
            Err(ConfigError::Missing {
                var: ENV_API_URL.into()
            })
        );
        assert!(matches!(
            ClientConfig::from_lookup(lookup_from(&[(ENV_API_URL, "ftp://guide.example")])),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn from_lookup_rejects_bad_numbers_and_store_kinds() {
        let bad_timeout = lookup_from(&[
            (ENV_API_URL, "https://guide.example"),
            (ENV_REQUEST_TIMEOUT_SECS, "0"),
        ]);
        assert!(matches!(
            ClientConfig::from_lookup(bad_timeout),
            Err(ConfigError::Invalid { .. })
        ));

        let bad_store = lookup_from(&[
            (ENV_API_URL, "https://guide.example"),
            (ENV_TOKEN_STORE, "cookies"),
        ]);
        assert!(matches!(
            ClientConfig::from_lookup(bad_store),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
