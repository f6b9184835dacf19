//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use storyhall_narration::guarded::NarrationLimits;
use storyhall_narration::openai::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};

use crate::error::AppError;

/// Connection details for an OpenAI-compatible narration service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// Bearer token.
    pub api_key: String,
    /// Service root, without the `/v1/...` path.
    pub base_url: String,
    /// Model name sent with each request.
    pub model: String,
}

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind.
    pub addr: SocketAddr,
    /// Base for join URLs. Derived from the request `Host` header when unset.
    pub public_base_url: Option<String>,
    /// Bounds on narration calls.
    pub narration: NarrationLimits,
    /// Remote narration service; the rule-based narrator is used when unset.
    pub openai: Option<OpenAiConfig>,
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's value
    /// if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;

        let defaults = NarrationLimits::default();
        let timeout = match var("NARRATION_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(raw.parse().map_err(|e| {
                AppError::Config(format!("NARRATION_TIMEOUT_MS must be milliseconds: {e}"))
            })?),
            None => defaults.timeout,
        };
        let max_concurrent = match var("NARRATION_MAX_CONCURRENT") {
            Some(raw) => raw.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                AppError::Config("NARRATION_MAX_CONCURRENT must be a positive integer".to_string())
            })?,
            None => defaults.max_concurrent,
        };

        let openai = var("OPENAI_API_KEY").map(|api_key| OpenAiConfig {
            api_key,
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        });

        Ok(Self {
            addr,
            public_base_url: var("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
            narration: NarrationLimits {
                timeout,
                max_concurrent,
            },
            openai,
        })
    }

    /// Join-link base pointing at the bound address. A wildcard host is
    /// reported as `localhost`.
    #[must_use]
    pub fn local_base_url(&self) -> String {
        if self.addr.ip().is_unspecified() {
            format!("http://localhost:{}", self.addr.port())
        } else {
            format!("http://{}", self.addr)
        }
    }
}
