//! Credential resolution: explicit options first, environment variables second.

use std::fmt;

use base64::prelude::*;
use serde::Deserialize;
use url::Url;

use crate::domain::{API_USERNAME, ApiKey, Domain, ValidationError};

/// Default Mailgun API host (US region).
pub const DEFAULT_BASE_URL: &str = "https://api.mailgun.net";

/// Mailgun API host for accounts in the EU region.
pub const EU_BASE_URL: &str = "https://api.eu.mailgun.net";

/// Source of fallback configuration values.
///
/// [`ProcessEnv`] reads the real process environment. Any
/// `Fn(&str) -> Option<String>` works too, which keeps resolution testable
/// without mutating process state.
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// [`Environment`] backed by [`std::env::var`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<F> Environment for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn var(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Options accepted when constructing a client.
///
/// Every field is optional; `domain` and `api_key` fall back to
/// `MAILGUN_DOMAIN` and `MAILGUN_API_KEY`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub domain: Option<String>,
    pub api_key: Option<String>,
    /// Echo outbound URLs and requests at `debug` level.
    pub debug_logging: bool,
    /// Override the API host, e.g. [`EU_BASE_URL`].
    pub base_url: Option<String>,
}

/// Which required setting could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Domain,
    ApiKey,
}

impl ConfigField {
    pub fn option_name(self) -> &'static str {
        match self {
            Self::Domain => Domain::FIELD,
            Self::ApiKey => ApiKey::FIELD,
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            Self::Domain => Domain::ENV,
            Self::ApiKey => ApiKey::ENV,
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Domain => "Mailgun domain",
            Self::ApiKey => "Mailgun API key",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "missing {}: set the `{}` option or the {} environment variable",
        .field.description(),
        .field.option_name(),
        .field.env_var()
    )]
    Missing { field: ConfigField },

    #[error("invalid base URL {value:?}: {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Resolved, immutable client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    domain: Domain,
    api_key: ApiKey,
    base_url: Url,
    debug_logging: bool,
}

impl ClientConfig {
    /// Resolve options against `env`. Domain is checked before the API key.
    pub fn resolve(options: &ClientOptions, env: &dyn Environment) -> Result<Self, ConfigError> {
        let domain = pick(options.domain.as_deref(), env, ConfigField::Domain)
            .and_then(|value| Domain::new(value).ok())
            .ok_or(ConfigError::Missing {
                field: ConfigField::Domain,
            })?;
        let api_key = pick(options.api_key.as_deref(), env, ConfigField::ApiKey)
            .and_then(|value| ApiKey::new(value).ok())
            .ok_or(ConfigError::Missing {
                field: ConfigField::ApiKey,
            })?;

        let raw_base = options
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        let base_url = Url::parse(raw_base).map_err(|source| ConfigError::InvalidBaseUrl {
            value: raw_base.to_owned(),
            source,
        })?;

        Ok(Self {
            domain,
            api_key,
            base_url,
            debug_logging: options.debug_logging,
        })
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn username(&self) -> &'static str {
        API_USERNAME
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    /// `Basic base64(api:<key>)`.
    pub fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.username(), self.api_key.as_str());
        format!("Basic {}", BASE64_STANDARD.encode(credentials))
    }

    /// `{base_url}/v3/{domain}{path}`.
    ///
    /// Dot segments are rejected so the result always stays under `/v3/{domain}`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ValidationError> {
        let invalid = || ValidationError::InvalidPath {
            value: path.to_owned(),
        };
        if path.split(['/', '\\']).any(is_dot_segment) {
            return Err(invalid());
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let relative = path.trim_start_matches('/');
        Url::parse(&format!("{base}/v3/{}/{relative}", self.domain)).map_err(|_| invalid())
    }
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn pick(explicit: Option<&str>, env: &dyn Environment, field: ConfigField) -> Option<String> {
    explicit
        .map(str::to_owned)
        .filter(|value| !value.trim().is_empty())
        .or_else(|| env.var(field.env_var()))
        .filter(|value| !value.trim().is_empty())
}
