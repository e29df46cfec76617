use std::time::Duration;

use url::Url;

use crate::{GatewayError, GatewayResult};

pub const DEFAULT_REFRESH_PATH: &str = "auth/refresh";
const DEFAULT_KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long an entry without subscribers stays reusable. Zero discards it
    /// as soon as the last subscriber goes away.
    pub keep_unused_for: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            keep_unused_for: DEFAULT_KEEP_UNUSED_FOR,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: Url,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub refresh_path: String,
    pub cache: CachePolicy,
}

impl GatewayConfig {
    pub fn new(base_url: Url, user_agent: impl Into<String>) -> Self {
        Self {
            base_url,
            user_agent: user_agent.into(),
            request_timeout: Duration::from_secs(30),
            refresh_path: DEFAULT_REFRESH_PATH.to_owned(),
            cache: CachePolicy::default(),
        }
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidConfig(
                "CLINIC_API_URL must be an http(s) URL",
            ));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidConfig(
                "CLINIC_API_URL must be usable as a base URL",
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(GatewayError::InvalidConfig("user_agent must be set"));
        }
        if self.request_timeout.is_zero() {
            return Err(GatewayError::InvalidConfig(
                "request timeout must be greater than zero",
            ));
        }
        if self.refresh_path.trim_matches('/').is_empty() {
            return Err(GatewayError::InvalidConfig("refresh path must be set"));
        }
        Ok(())
    }

    /// Resolves a relative resource path against the origin. The origin is
    /// always treated as a directory, so `https://host/api` + `patients`
    /// yields `https://host/api/patients`.
    pub fn endpoint_url(&self, path: &str) -> GatewayResult<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|err| GatewayError::message(format!("invalid endpoint path '{path}': {err}")))
    }
}
