//! Time- and concurrency-bounded narration with rule-based fallback.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use storyhall_memory::campaign::CampaignSnapshot;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::error::NarrationError;
use crate::narrator::Narrator;
use crate::rule_based::RuleBasedNarrator;

/// Limits applied to every narration call.
#[derive(Debug, Clone, Copy)]
pub struct NarrationLimits {
    /// Upper bound on one call, including time spent waiting for a permit.
    pub timeout: Duration,
    /// Calls allowed in flight at once, across all sessions.
    pub max_concurrent: usize,
}

impl Default for NarrationLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_concurrent: 8,
        }
    }
}

/// Infallible front for a [`Narrator`].
///
/// Any backend error, timeout or blank answer is replaced by
/// [`RuleBasedNarrator`] output, so callers always get text.
#[derive(Clone)]
pub struct GuardedNarrator {
    primary: Arc<dyn Narrator>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl std::fmt::Debug for GuardedNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedNarrator")
            .field("timeout", &self.timeout)
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl GuardedNarrator {
    /// Wraps `primary` with the given limits.
    #[must_use]
    pub fn new(primary: Arc<dyn Narrator>, limits: NarrationLimits) -> Self {
        Self {
            primary,
            permits: Arc::new(Semaphore::new(limits.max_concurrent.max(1))),
            timeout: limits.timeout,
        }
    }

    /// Narration for `player_input`. Never fails.
    pub async fn narrate(&self, player_input: &str, context: &CampaignSnapshot) -> String {
        match self
            .bounded(self.primary.narrate(player_input, context))
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "narration service failed, using rule-based response");
                RuleBasedNarrator::respond(player_input)
            }
        }
    }

    /// Campaign introduction for `setting`. Never fails.
    pub async fn introduce(&self, setting: &str) -> String {
        match self.bounded(self.primary.introduce(setting)).await {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "introduction failed, using default introduction");
                RuleBasedNarrator::introduction(setting)
            }
        }
    }

    async fn bounded<F>(&self, call: F) -> Result<String, NarrationError>
    where
        F: Future<Output = Result<String, NarrationError>>,
    {
        let guarded = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| NarrationError::Unavailable(e.to_string()))?;
            call.await
        };

        let text = tokio::time::timeout(self.timeout, guarded)
            .await
            .map_err(|_| NarrationError::Timeout(self.timeout))??;

        if text.trim().is_empty() {
            return Err(NarrationError::InvalidResponse("blank narration".to_owned()));
        }
        Ok(text)
    }
}
