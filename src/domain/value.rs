use std::fmt;

use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Mailgun sending domain (for example `mail.example.com`).
///
/// Invariant: non-empty after trimming.
pub struct Domain(String);

impl Domain {
    /// Option name used when configuring the client (`domain`).
    pub const FIELD: &'static str = "domain";

    /// Environment variable consulted when no explicit domain is configured.
    pub const ENV: &'static str = "MAILGUN_DOMAIN";

    /// Create a validated [`Domain`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated domain.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Mailgun private API key.
///
/// Invariant: non-empty after trimming. `Debug` output is redacted.
pub struct ApiKey(String);

impl ApiKey {
    /// Option name used when configuring the client (`api_key`).
    pub const FIELD: &'static str = "api_key";

    /// Environment variable consulted when no explicit key is configured.
    pub const ENV: &'static str = "MAILGUN_API_KEY";

    /// Create a validated [`ApiKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Basic-auth user name Mailgun expects for API key authentication.
pub const API_USERNAME: &str = "api";
