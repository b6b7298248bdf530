//! Client configuration.
//!
//! A [`Config`] is a plain value: build it with the setters below or load it from
//! `MONITOR_*` environment variables, then hand it to [`crate::Client::new`].

use crate::auth::AuthConfig;
use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::secret::Secret;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "MONITOR_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "MONITOR_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "MONITOR_MAX_RETRIES";
pub const ENV_DEBUG: &str = "MONITOR_DEBUG";
pub const ENV_TOKEN: &str = "MONITOR_TOKEN";
pub const ENV_API_KEY: &str = "MONITOR_API_KEY";
pub const ENV_API_SECRET: &str = "MONITOR_API_SECRET";
pub const ENV_SERVER_UUID: &str = "MONITOR_SERVER_UUID";
pub const ENV_SERVER_SECRET: &str = "MONITOR_SERVER_SECRET";
pub const ENV_MONITORING_KEY: &str = "MONITOR_MONITORING_KEY";
pub const ENV_REGISTRATION_KEY: &str = "MONITOR_REGISTRATION_KEY";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Emit per-attempt request traces (credentials redacted) at `debug` level.
    pub debug: bool,
    pub user_agent: String,
    pub auth: AuthConfig,
}

impl Config {
    pub fn new(base_url: impl Into<String>, auth: AuthConfig) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            debug: false,
            user_agent: format!("monitor-lib/{}", crate::VERSION),
            auth,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Load from the process environment. See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any variable source. `MONITOR_API_URL` is required; numeric and
    /// boolean variables fall back to defaults when absent and fail when malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let secret = |name: &str| get(name).map(Secret::new);

        let base_url = get(ENV_API_URL).ok_or_else(|| invalid(format!("{} is not set", ENV_API_URL)))?;
        let auth = AuthConfig {
            token: secret(ENV_TOKEN),
            api_key: secret(ENV_API_KEY),
            api_secret: secret(ENV_API_SECRET),
            server_uuid: secret(ENV_SERVER_UUID),
            server_secret: secret(ENV_SERVER_SECRET),
            monitoring_key: secret(ENV_MONITORING_KEY),
            registration_key: secret(ENV_REGISTRATION_KEY),
        };
        let mut config = Self::new(base_url, auth);

        if let Some(v) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = v
                .parse()
                .map_err(|_| invalid(format!("Invalid {}: {}", ENV_TIMEOUT_SECS, v)))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get(ENV_MAX_RETRIES) {
            config.retry.max_retries = v
                .parse()
                .map_err(|_| invalid(format!("Invalid {}: {}", ENV_MAX_RETRIES, v)))?;
        }
        if let Some(v) = get(ENV_DEBUG) {
            config.debug = parse_bool(&v).ok_or_else(|| invalid(format!("Invalid {}: {}", ENV_DEBUG, v)))?;
        }
        Ok(config)
    }
}

fn invalid(message: String) -> Error {
    Error::Configuration(message)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
