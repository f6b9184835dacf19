//! Keyword-driven narration used when no remote service is configured or the
//! remote call fails.

use async_trait::async_trait;
use storyhall_memory::campaign::CampaignSnapshot;

use crate::error::NarrationError;
use crate::narrator::Narrator;

/// Deterministic narrator keyed on words in the player's input.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedNarrator;

const RULES: &[(&[&str], &str)] = &[
    (
        &["attack", "fight"],
        "You engage in combat! Roll for initiative (1d20). What's your attack strategy?",
    ),
    (
        &["search", "look"],
        "You carefully examine your surroundings. The dimly lit chamber reveals ancient \
         markings on the walls and a faint draft coming from the north.",
    ),
    (
        &["door", "open"],
        "The door creaks ominously as you approach. Do you want to check for traps first, \
         or push it open?",
    ),
    (
        &["talk", "speak"],
        "The mysterious figure regards you cautiously, waiting to hear what you have to say.",
    ),
    (
        &["heal", "rest"],
        "You take a moment to tend to your wounds. Roll a medicine check (1d20) if you want \
         to use healing supplies.",
    ),
];

impl RuleBasedNarrator {
    /// Picks a canned response for `player_input`.
    #[must_use]
    pub fn respond(player_input: &str) -> String {
        let input = player_input.to_lowercase();
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| input.contains(k)))
            .map_or_else(
                || {
                    format!(
                        "Interesting choice. As you {player_input}, you notice the atmosphere \
                         growing tense. What do you do next?"
                    )
                },
                |(_, response)| (*response).to_owned(),
            )
    }

    /// The default campaign opening.
    #[must_use]
    pub fn introduction(setting: &str) -> String {
        format!(
            "Welcome, brave adventurers! You find yourselves at the edge of a mysterious \
             {setting} realm, where danger and glory await in equal measure. The air crackles \
             with magic and possibility. Your journey begins now..."
        )
    }
}

#[async_trait]
impl Narrator for RuleBasedNarrator {
    async fn narrate(
        &self,
        player_input: &str,
        _context: &CampaignSnapshot,
    ) -> Result<String, NarrationError> {
        Ok(Self::respond(player_input))
    }

    async fn introduce(&self, setting: &str) -> Result<String, NarrationError> {
        Ok(Self::introduction(setting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combat_keywords_ask_for_initiative() {
        assert!(RuleBasedNarrator::respond("I ATTACK the goblin").contains("initiative"));
        assert!(RuleBasedNarrator::respond("we fight").contains("initiative"));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // "look" precedes "door" in rule order.
        let response = RuleBasedNarrator::respond("look at the door");
        assert!(response.starts_with("You carefully examine"));
    }

    #[test]
    fn test_unmatched_input_is_echoed() {
        assert_eq!(
            RuleBasedNarrator::respond("sing a ballad"),
            "Interesting choice. As you sing a ballad, you notice the atmosphere growing \
             tense. What do you do next?"
        );
    }

    #[test]
    fn test_introduction_mentions_setting() {
        assert!(RuleBasedNarrator::introduction("steampunk").contains("mysterious steampunk realm"));
    }

    #[tokio::test]
    async fn test_trait_impl_never_fails() {
        let text = RuleBasedNarrator
            .narrate("rest by the fire", &CampaignSnapshot::default())
            .await
            .unwrap();
        assert!(text.contains("medicine check"));
    }
}
