//! Provider Configuration
//!
//! Everything is read from environment variables; the server loads a
//! `.env` file first.

use std::time::Duration;

use checkout_core::{CheckoutError, Result};

/// Tokenization provider environment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenizationEnvironment {
    #[default]
    Sandbox,
    Production,
}

/// Anything that is not a production alias selects the sandbox
impl std::str::FromStr for TokenizationEnvironment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "production" | "prod" | "live" => Self::Production,
            _ => Self::Sandbox,
        })
    }
}

impl TokenizationEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://api.sandbox.basistheory.ai",
            Self::Production => "https://api.basistheory.ai",
        }
    }
}

/// Commerce provider settings
#[derive(Clone, Debug)]
pub struct CommerceConfig {
    /// Base URL, without trailing slash
    pub base_url: String,

    /// Client API key sent as `x-api-key`
    pub client_api_key: String,

    /// Secret sent as `x-client-secret` on order calls
    pub client_secret: String,

    pub timeout: Duration,
}

impl CommerceConfig {
    pub fn new(base_url: impl Into<String>, client_api_key: impl Into<String>) -> Self {
        let client_api_key = client_api_key.into();
        Self {
            base_url: trim_base(base_url.into()),
            client_secret: client_api_key.clone(),
            client_api_key,
            timeout: Duration::from_secs(default_timeout_secs()),
        }
    }

    pub fn from_env() -> Result<Self> {
        let base_url = required("COMMERCE_BASE_URL")?;
        let client_api_key = required("COMMERCE_CLIENT_API_KEY")?;
        let mut config = Self::new(base_url, client_api_key);
        if let Ok(secret) = std::env::var("COMMERCE_CLIENT_SECRET") {
            config.client_secret = secret;
        }
        config.timeout = timeout_from_env();
        Ok(config)
    }
}

/// Tokenization provider settings
#[derive(Clone, Debug)]
pub struct TokenizationConfig {
    pub environment: TokenizationEnvironment,

    /// Base URL, without trailing slash
    pub base_url: String,

    pub timeout: Duration,
}

impl TokenizationConfig {
    pub fn new(environment: TokenizationEnvironment) -> Self {
        Self {
            environment,
            base_url: environment.default_base_url().to_string(),
            timeout: Duration::from_secs(default_timeout_secs()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url.into());
        self
    }

    pub fn from_env() -> Self {
        let environment = std::env::var("TOKENIZATION_ENVIRONMENT")
            .ok()
            .and_then(|e| e.parse().ok())
            .unwrap_or_default();
        let mut config = Self::new(environment);
        if let Ok(base_url) = std::env::var("TOKENIZATION_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        config.timeout = timeout_from_env();
        config
    }
}

impl Default for TokenizationConfig {
    fn default() -> Self {
        Self::new(TokenizationEnvironment::default())
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CheckoutError::Config(format!("{key} not set")))
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn timeout_from_env() -> Duration {
    let secs = std::env::var("REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(default_timeout_secs);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        let parse = |s: &str| s.parse::<TokenizationEnvironment>().unwrap();
        assert_eq!(parse("PRODUCTION"), TokenizationEnvironment::Production);
        assert_eq!(parse(" live "), TokenizationEnvironment::Production);
        assert_eq!(parse("sandbox"), TokenizationEnvironment::Sandbox);
        assert_eq!(parse("anything"), TokenizationEnvironment::Sandbox);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = CommerceConfig::new("https://commerce.test/", "ck_1");
        assert_eq!(config.base_url, "https://commerce.test");
        assert_eq!(config.client_secret, "ck_1");

        let config = TokenizationConfig::default().with_base_url("http://localhost:9000/");
        assert_eq!(config.base_url, "http://localhost:9000");
    }
}
