use std::env;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid quiz service base URL")]
    InvalidBaseUrl,
}

/// Connection settings for the remote quiz service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizServiceConfig {
    base_url: String,
    bearer_token: Option<String>,
}

impl QuizServiceConfig {
    /// Build a config from an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` when the URL does not parse.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if Url::parse(&base_url).is_err() {
            return Err(ConfigError::InvalidBaseUrl);
        }
        Ok(Self {
            base_url,
            bearer_token: None,
        })
    }

    /// Read the config from `REMEMBER_WORD_API_URL` and, optionally,
    /// `REMEMBER_WORD_API_TOKEN`. Returns `None` when no URL is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = normalize_optional(env::var("REMEMBER_WORD_API_URL").ok())?;
        let mut config = Self::new(base_url).ok()?;
        config.bearer_token = normalize_optional(env::var("REMEMBER_WORD_API_TOKEN").ok());
        Some(config)
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = normalize_optional(Some(token.into()));
        self
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
