//! Process configuration.
//!
//! Read once at startup from environment variables. [`Config::from_lookup`]
//! takes the lookup function as a parameter so tests never touch the real
//! environment.

use std::fmt;
use std::net::SocketAddr;

use chrono::Duration;
use secrecy::SecretString;
use thiserror::Error;

use crate::cascade::{
    CascadePolicy, CascadeStrategy, DEFAULT_DEVELOPMENT_BRANCH, DEFAULT_RELEASE_PREFIX,
};

pub const ENV_SHARED_KEY: &str = "BITBUCKET_SHARED_KEY";
pub const ENV_USERNAME: &str = "BITBUCKET_USERNAME";
pub const ENV_PASSWORD: &str = "BITBUCKET_PASSWORD";
pub const ENV_API_URL: &str = "BITBUCKET_API_URL";
pub const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";
pub const ENV_RELEASE_PREFIX: &str = "RELEASE_BRANCH_PREFIX";
pub const ENV_DEVELOPMENT_BRANCH: &str = "DEVELOPMENT_BRANCH_NAME";
pub const ENV_STRATEGY: &str = "CASCADE_STRATEGY";
pub const ENV_DEDUPE_WINDOW: &str = "DEDUPE_WINDOW_SECS";

pub const DEFAULT_API_URL: &str = "https://api.bitbucket.org/2.0/";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Error type for configuration failures. Always names the variable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the binary needs to start.
#[derive(Clone)]
pub struct Config {
    /// Key expected in the webhook `key` query parameter.
    pub shared_key: SecretString,
    /// Bot account username.
    pub username: String,
    /// Bot account app password.
    pub password: SecretString,
    pub api_url: String,
    pub listen_addr: SocketAddr,
    pub policy: CascadePolicy,
    /// `None` when de-duplication is disabled.
    pub dedupe_window: Option<Duration>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let shared_key = SecretString::new(required(ENV_SHARED_KEY)?.into());
        let username = required(ENV_USERNAME)?;
        let password = SecretString::new(required(ENV_PASSWORD)?.into());

        let api_url = get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let listen_addr_raw =
            get(ENV_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: ENV_LISTEN_ADDR,
                value: listen_addr_raw.clone(),
                reason: e.to_string(),
            })?;

        let release_prefix =
            get(ENV_RELEASE_PREFIX).unwrap_or_else(|| DEFAULT_RELEASE_PREFIX.to_string());
        let development_branch =
            get(ENV_DEVELOPMENT_BRANCH).unwrap_or_else(|| DEFAULT_DEVELOPMENT_BRANCH.to_string());

        let strategy = match get(ENV_STRATEGY) {
            Some(raw) => raw
                .parse::<CascadeStrategy>()
                .map_err(|e| ConfigError::Invalid {
                    var: ENV_STRATEGY,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => CascadeStrategy::default(),
        };

        let dedupe_window = match get(ENV_DEDUPE_WINDOW) {
            Some(raw) => {
                let secs = raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                    var: ENV_DEDUPE_WINDOW,
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                (secs > 0).then(|| Duration::seconds(i64::from(secs)))
            }
            None => None,
        };

        Ok(Config {
            shared_key,
            username,
            password,
            api_url,
            listen_addr,
            policy: CascadePolicy::new(release_prefix, development_branch).with_strategy(strategy),
            dedupe_window,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("api_url", &self.api_url)
            .field("listen_addr", &self.listen_addr)
            .field("policy", &self.policy)
            .field("dedupe_window", &self.dedupe_window)
            .finish_non_exhaustive()
    }
}
