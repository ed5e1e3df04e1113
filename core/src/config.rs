//! Process-level client configuration.
//!
//! Reads credentials and the account domain from the environment:
//!
//! - `AMOCRM_DOMAIN` — account subdomain, e.g. `acme` for `acme.amocrm.ru`
//! - `AMOCRM_LOGIN` / `AMOCRM_API_KEY` — API credentials (required)
//! - `AMOCRM_BASE_URL` — overrides the URL derived from the domain
//! - `AMOCRM_TIMEOUT_SECS` — per-request timeout (default 30)

use std::time::Duration;

use url::Url;

use crate::error::ApiError;
use crate::transport::Credentials;

pub const DOMAIN_ENV: &str = "AMOCRM_DOMAIN";
pub const LOGIN_ENV: &str = "AMOCRM_LOGIN";
pub const API_KEY_ENV: &str = "AMOCRM_API_KEY";
pub const BASE_URL_ENV: &str = "AMOCRM_BASE_URL";
pub const TIMEOUT_ENV: &str = "AMOCRM_TIMEOUT_SECS";

/// Source of environment variables.
pub trait EnvSource {
    fn string(&self, key: &str) -> Option<String>;
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Connection settings for one CRM account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmConfig {
    pub domain: Option<String>,
    pub credentials: Credentials,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl CrmConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const MIN_TIMEOUT_SECS: u64 = 1;
    const MAX_TIMEOUT_SECS: u64 = 600;

    pub fn new(domain: &str, login: &str, api_key: &str) -> Self {
        Self {
            domain: Some(domain.to_string()),
            credentials: Credentials {
                login: login.to_string(),
                api_key: api_key.to_string(),
            },
            base_url: None,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_env_with(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration from a custom environment source.
    pub fn from_env_with(env: &impl EnvSource) -> Result<Self, ApiError> {
        let non_empty = |key: &str| env.string(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            non_empty(key).ok_or_else(|| ApiError::Config(format!("{key} is not set")))
        };

        let login = required(LOGIN_ENV)?;
        let api_key = required(API_KEY_ENV)?;
        let timeout_secs = match non_empty(TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ApiError::Config(format!("{TIMEOUT_ENV}={raw}: {e}")))?,
            None => Self::DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            domain: non_empty(DOMAIN_ENV),
            credentials: Credentials { login, api_key },
            base_url: non_empty(BASE_URL_ENV),
            timeout: Duration::from_secs(
                timeout_secs.clamp(Self::MIN_TIMEOUT_SECS, Self::MAX_TIMEOUT_SECS),
            ),
        };
        config.base_url()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The account's root URL: the explicit override, else
    /// `https://<domain>.amocrm.ru/`.
    pub fn base_url(&self) -> Result<Url, ApiError> {
        if let Some(base_url) = &self.base_url {
            return Ok(Url::parse(base_url)?);
        }
        match &self.domain {
            Some(domain) => Ok(Url::parse(&format!("https://{}.amocrm.ru/", domain.trim()))?),
            None => Err(ApiError::Config(format!(
                "either {DOMAIN_ENV} or {BASE_URL_ENV} must be set"
            ))),
        }
    }
}
