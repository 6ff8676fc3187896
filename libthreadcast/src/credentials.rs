//! Process-wide API credentials
//!
//! Credentials are read from the environment once at startup and kept in
//! [`SecretString`]s so they are zeroed on drop and never show up in `Debug`
//! output or logs.

use secrecy::SecretString;

use crate::error::ConfigError;

pub const X_API_KEY: &str = "X_API_KEY";
pub const X_API_SECRET: &str = "X_API_SECRET";
pub const X_ACCESS_TOKEN: &str = "X_ACCESS_TOKEN";
pub const X_ACCESS_SECRET: &str = "X_ACCESS_SECRET";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// OAuth 1.0a user-context credentials for the X API
#[derive(Debug, Clone)]
pub struct XCredentials {
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub access_token: SecretString,
    pub access_secret: SecretString,
}

impl XCredentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            api_secret: SecretString::from(api_secret.into()),
            access_token: SecretString::from(access_token.into()),
            access_secret: SecretString::from(access_secret.into()),
        }
    }

    /// Read all four values; the first missing or blank one is reported
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required_env(X_API_KEY)?,
            api_secret: required_env(X_API_SECRET)?,
            access_token: required_env(X_ACCESS_TOKEN)?,
            access_secret: required_env(X_ACCESS_SECRET)?,
        })
    }
}

/// Gemini API key, if configured
pub fn gemini_api_key() -> Option<SecretString> {
    required_env(GEMINI_API_KEY).ok()
}

fn required_env(name: &str) -> Result<SecretString, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim().to_string())),
        _ => Err(ConfigError::MissingCredential(name.to_string())),
    }
}
