//! Test narrators — `Narrator` implementations with scripted behavior.

use std::sync::Mutex;

use async_trait::async_trait;
use storyhall_memory::campaign::CampaignSnapshot;
use storyhall_narration::error::NarrationError;
use storyhall_narration::narrator::Narrator;
use tokio::sync::Notify;

/// Always answers with the same text and records every request.
#[derive(Debug)]
pub struct ScriptedNarrator {
    reply: String,
    calls: Mutex<Vec<(String, CampaignSnapshot)>>,
}

impl ScriptedNarrator {
    /// Create a narrator that answers every call with `reply`.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the `(input, context)` pairs received by `narrate`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<(String, CampaignSnapshot)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    async fn narrate(
        &self,
        player_input: &str,
        context: &CampaignSnapshot,
    ) -> Result<String, NarrationError> {
        self.calls
            .lock()
            .unwrap()
            .push((player_input.to_owned(), context.clone()));
        Ok(self.reply.clone())
    }

    async fn introduce(&self, setting: &str) -> Result<String, NarrationError> {
        Ok(format!("{} ({setting})", self.reply))
    }
}

/// Always fails, forcing the rule-based fallback.
#[derive(Debug)]
pub struct FailingNarrator;

#[async_trait]
impl Narrator for FailingNarrator {
    async fn narrate(&self, _: &str, _: &CampaignSnapshot) -> Result<String, NarrationError> {
        Err(NarrationError::RequestFailed("connection refused".into()))
    }

    async fn introduce(&self, _: &str) -> Result<String, NarrationError> {
        Err(NarrationError::RequestFailed("connection refused".into()))
    }
}

/// Never answers. Exercises the timeout path.
#[derive(Debug)]
pub struct StalledNarrator;

#[async_trait]
impl Narrator for StalledNarrator {
    async fn narrate(&self, _: &str, _: &CampaignSnapshot) -> Result<String, NarrationError> {
        std::future::pending().await
    }

    async fn introduce(&self, _: &str) -> Result<String, NarrationError> {
        std::future::pending().await
    }
}

/// Suspends each call until the test releases it, so tests can change state
/// while a handler is parked at the narration call.
#[derive(Debug)]
pub struct GatedNarrator {
    reply: String,
    entered: Notify,
    release: Notify,
}

impl GatedNarrator {
    /// Create a gated narrator that eventually answers with `reply`.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Resolves once a call has reached the narrator.
    pub async fn wait_until_called(&self) {
        self.entered.notified().await;
    }

    /// Lets one parked call answer.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn park(&self) -> Result<String, NarrationError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.reply.clone())
    }
}

#[async_trait]
impl Narrator for GatedNarrator {
    async fn narrate(&self, _: &str, _: &CampaignSnapshot) -> Result<String, NarrationError> {
        self.park().await
    }

    async fn introduce(&self, _: &str) -> Result<String, NarrationError> {
        self.park().await
    }
}
