//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storyhall_memory::campaign::CampaignSnapshot;

use crate::error::NarrationError;
use crate::narrator::Narrator;

/// Default API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";

/// Log entries included as history in each request.
const HISTORY_ENTRIES: usize = 10;

const DM_SYSTEM_PROMPT: &str = "You are an expert Dungeon Master for a fantasy tabletop RPG.
You create immersive, engaging narratives that respond to player actions.
Keep responses concise (2-4 sentences) but vivid and atmospheric.
Describe outcomes of actions, introduce challenges, and advance the story.
If players attempt risky actions, suggest appropriate dice rolls.";

const INTRO_SYSTEM_PROMPT: &str =
    "You are a Dungeon Master starting a new campaign. Create a brief, exciting introduction.";

/// Narrator backed by a remote chat completions endpoint.
#[derive(Clone)]
pub struct OpenAiNarrator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for OpenAiNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiNarrator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiNarrator {
    /// Creates a client. `request_timeout` bounds each HTTP exchange.
    #[must_use]
    pub fn new(base_url: &str, api_key: &str, model: &str, request_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
        }
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> Result<String, NarrationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature: 0.9,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NarrationError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrationError::RequestFailed(format!("{status}: {body}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| NarrationError::InvalidResponse(e.to_string()))?;

        extract_text(body)
    }
}

#[async_trait]
impl Narrator for OpenAiNarrator {
    async fn narrate(
        &self,
        player_input: &str,
        context: &CampaignSnapshot,
    ) -> Result<String, NarrationError> {
        self.complete(build_messages(player_input, context), 300)
            .await
    }

    async fn introduce(&self, setting: &str) -> Result<String, NarrationError> {
        let messages = vec![
            ChatMessage::system(INTRO_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Create a campaign introduction for a {setting} setting (3-4 sentences)."
            )),
        ];
        self.complete(messages, 200).await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_owned(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Builds the prompt: DM instructions, recent history, then the player's words.
pub(crate) fn build_messages(player_input: &str, context: &CampaignSnapshot) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(DM_SYSTEM_PROMPT)];

    if !context.messages.is_empty() {
        let skip = context.messages.len().saturating_sub(HISTORY_ENTRIES);
        let history = context
            .messages
            .iter()
            .skip(skip)
            .map(|m| format!("{}: {}", m.speaker, m.text))
            .collect::<Vec<_>>()
            .join("\n");
        messages.push(ChatMessage::system(format!(
            "{}\nRecent campaign events:\n{history}",
            context.summary
        )));
    }

    messages.push(ChatMessage::user(player_input));
    messages
}

fn extract_text(body: ChatResponse) -> Result<String, NarrationError> {
    let text = body
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_owned())
        .ok_or_else(|| NarrationError::InvalidResponse("no choices returned".to_owned()))?;

    if text.is_empty() {
        return Err(NarrationError::InvalidResponse("empty completion".to_owned()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use storyhall_memory::campaign::CampaignSummary;
    use storyhall_memory::entry::EventLogEntry;

    fn context_with(lines: usize) -> CampaignSnapshot {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        CampaignSnapshot {
            messages: (0..lines)
                .map(|i| EventLogEntry::speech("Aria", format!("line {i}"), at))
                .collect(),
            summary: CampaignSummary {
                entry_count: lines,
                dice_roll_count: 0,
            },
            ..CampaignSnapshot::default()
        }
    }

    #[test]
    fn test_empty_context_sends_prompt_and_input_only() {
        let messages = build_messages("I open the chest", &CampaignSnapshot::default());

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1], ChatMessage::user("I open the chest"));
    }

    #[test]
    fn test_history_is_limited_to_last_ten_entries() {
        let messages = build_messages("next", &context_with(15));

        assert_eq!(messages.len(), 3);
        let history = &messages[1].content;
        assert!(history.starts_with("Campaign with 15 events (0 dice rolls)."));
        assert!(!history.contains("line 4\n"));
        assert!(history.contains("Aria: line 5"));
        assert!(history.ends_with("Aria: line 14"));
    }

    #[test]
    fn test_extract_text_trims_and_rejects_empty() {
        let ok = ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessage::system("  The torch flickers.  "),
            }],
        };
        assert_eq!(extract_text(ok).unwrap(), "The torch flickers.");

        let blank = ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessage::system("   "),
            }],
        };
        assert!(matches!(
            extract_text(blank),
            Err(NarrationError::InvalidResponse(_))
        ));

        let none = ChatResponse { choices: vec![] };
        assert!(extract_text(none).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let narrator = OpenAiNarrator::new(
            "http://localhost:8080/",
            "key",
            DEFAULT_OPENAI_MODEL,
            Duration::from_secs(1),
        );
        assert_eq!(narrator.base_url, "http://localhost:8080");
    }
}
