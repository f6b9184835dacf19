//! Narration backend abstraction.

use async_trait::async_trait;
use storyhall_memory::campaign::CampaignSnapshot;

use crate::error::NarrationError;

/// A service that produces DM narration.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Responds to `player_input` given the campaign `context`.
    async fn narrate(
        &self,
        player_input: &str,
        context: &CampaignSnapshot,
    ) -> Result<String, NarrationError>;

    /// Produces an opening for a new campaign in the given setting.
    async fn introduce(&self, setting: &str) -> Result<String, NarrationError>;
}
