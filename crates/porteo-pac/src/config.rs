//! PAC client configuration.
//!
//! Defaults point at the provider's test environment; live stamping must be
//! opted into explicitly. Override via environment variables or explicit
//! construction.

use std::time::Duration;

use url::Url;

use crate::retry::RetryPolicy;

/// Which provider environment stamps are sent to.
///
/// Test stamps carry no fiscal effect and are free on the provider side;
/// the credit ledger still debits them so quota behavior matches live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacEnvironment {
    /// Provider sandbox. Stamps are not registered with the tax authority.
    Test,
    /// Production. Stamps are legally binding fiscal events.
    Live,
}

impl std::fmt::Display for PacEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Test => "test",
            Self::Live => "live",
        })
    }
}

impl std::str::FromStr for PacEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "test" | "sandbox" => Ok(Self::Test),
            "live" | "production" => Ok(Self::Live),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

/// Configuration for connecting to the certification provider.
///
/// Custom `Debug` implementation redacts `api_token` to prevent credential
/// leakage in log output.
#[derive(Clone)]
pub struct PacConfig {
    /// Provider environment.
    pub environment: PacEnvironment,
    /// Base URL of the provider API.
    pub base_url: Url,
    /// Bearer token for provider authentication.
    pub api_token: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Backoff schedule for transient transport failures.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for PacConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacConfig")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl PacConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORTEO_PAC_ENV` (default: `test`)
    /// - `PORTEO_PAC_URL` (default: `https://timbrado.porteo-pac.mx/api/v1`)
    /// - `PORTEO_PAC_TOKEN` (required)
    /// - `PORTEO_PAC_TIMEOUT_SECS` (default: 30)
    /// - `PORTEO_PAC_MAX_RETRIES` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = std::env::var("PORTEO_PAC_TOKEN").map_err(|_| ConfigError::MissingToken)?;
        let environment = match std::env::var("PORTEO_PAC_ENV") {
            Ok(raw) => raw.parse()?,
            Err(_) => PacEnvironment::Test,
        };

        Ok(Self {
            environment,
            base_url: env_url("PORTEO_PAC_URL", "https://timbrado.porteo-pac.mx/api/v1")?,
            api_token,
            timeout_secs: std::env::var("PORTEO_PAC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            retry: RetryPolicy {
                max_retries: std::env::var("PORTEO_PAC_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
                ..RetryPolicy::default()
            },
        })
    }

    /// Create a configuration pointing at a local mock server (for testing).
    pub fn local_mock(base_url: &str, token: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            environment: PacEnvironment::Test,
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl("local_mock".to_string(), e.to_string()))?,
            api_token: token.to_string(),
            timeout_secs: 5,
            // Short backoff keeps retry-exhaustion tests fast.
            retry: RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(25),
            },
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORTEO_PAC_TOKEN environment variable is required")]
    MissingToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("api token contains characters not allowed in an HTTP header")]
    InvalidToken,
    #[error("invalid PAC environment {0:?} (expected \"test\" or \"live\")")]
    InvalidEnvironment(String),
}
