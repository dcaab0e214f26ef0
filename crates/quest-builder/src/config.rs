//! Client configuration read from environment variables.
//!
//! - `QUEST_BACKEND_URL`: backend base URL (default: "http://localhost:8000")
//! - `QUEST_USER_ID`: user id sent with chat requests (default: "local-parent")
//! - `QUEST_REQUEST_TIMEOUT_SECS`: per-request timeout (default: "60")
//! - `QUEST_RECONCILE`: `replace` or `preserve` (default: "replace")

use std::time::Duration;

use quest_core::ReconcilePolicy;

use crate::error::BuilderError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_USER_ID: &str = "local-parent";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    pub backend_url: String,
    pub user_id: String,
    pub request_timeout: Duration,
    pub reconcile_policy: ReconcilePolicy,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            reconcile_policy: ReconcilePolicy::default(),
        }
    }
}

impl BuilderConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, BuilderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BuilderError> {
        let mut config = BuilderConfig::default();

        if let Some(url) = lookup("QUEST_BACKEND_URL") {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BuilderError::Config(format!(
                    "QUEST_BACKEND_URL must be an http(s) URL, got '{}'",
                    url
                )));
            }
            config.backend_url = url;
        }

        if let Some(user_id) = lookup("QUEST_USER_ID") {
            if user_id.trim().is_empty() {
                return Err(BuilderError::Config("QUEST_USER_ID is empty".to_string()));
            }
            config.user_id = user_id;
        }

        if let Some(raw) = lookup("QUEST_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                BuilderError::Config(format!(
                    "QUEST_REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?;
            if secs == 0 {
                return Err(BuilderError::Config(
                    "QUEST_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("QUEST_RECONCILE") {
            config.reconcile_policy = raw.trim().parse().map_err(BuilderError::Config)?;
        }

        Ok(config)
    }
}
