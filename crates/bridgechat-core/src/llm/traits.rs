use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::constants::generation;
use crate::error::BridgeError;
use crate::ingest::FileRecord;
use crate::state::{ChatMessage, Role};

/// Incremental reply text. Finite and not restartable; an `Err` item is
/// always the last one.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, BridgeError>> + Send>>;

/// Turn author as the provider labels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl From<Role> for TurnRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => TurnRole::User,
            Role::Assistant => TurnRole::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Raw base64, no data-URI header.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Part::InlineData { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<TurnRole>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub thinking_config: ThinkingConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: generation::TEMPERATURE,
            top_p: generation::TOP_P,
            thinking_config: ThinkingConfig {
                thinking_budget: generation::THINKING_BUDGET,
            },
        }
    }
}

/// Body of one streaming completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl ChatRequest {
    /// Assemble the request: the trailing history window, then one user
    /// turn holding every attachment followed by the prompt.
    pub fn build(
        prompt: &str,
        files: &[FileRecord],
        history: &[ChatMessage],
        system_instruction: &str,
    ) -> Self {
        let window_start = history.len().saturating_sub(generation::HISTORY_WINDOW);
        let mut contents: Vec<Content> = history[window_start..]
            .iter()
            .map(|m| Content {
                role: Some(m.role.into()),
                parts: vec![Part::text(m.content.clone())],
            })
            .collect();

        let mut parts: Vec<Part> = files
            .iter()
            .map(|f| Part::InlineData {
                inline_data: InlineData {
                    mime_type: f.media_type.clone(),
                    data: f.payload().to_string(),
                },
            })
            .collect();
        parts.push(Part::text(prompt));

        contents.push(Content {
            role: Some(TurnRole::User),
            parts,
        });

        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(system_instruction)],
            },
            contents,
            generation_config: GenerationConfig::default(),
        }
    }

    /// Prior turns sent as context.
    pub fn history(&self) -> &[Content] {
        let end = self.contents.len().saturating_sub(1);
        &self.contents[..end]
    }

    /// The turn carrying the attachments and the new prompt.
    pub fn current_turn(&self) -> Option<&Content> {
        self.contents.last()
    }

    pub fn instruction_text(&self) -> Option<&str> {
        self.system_instruction.parts.first().and_then(Part::as_text)
    }
}

/// Anything that can stream a grounded reply. The orchestrator only talks to
/// this trait; `GeminiClient` is the production implementation.
pub trait ChatBackend: Send + Sync {
    /// Start a reply to `prompt`. Nothing is sent until the returned stream
    /// is first polled.
    fn stream_reply(
        &self,
        prompt: &str,
        files: &[FileRecord],
        history: &[ChatMessage],
    ) -> FragmentStream;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(id: u64, role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn pdf() -> FileRecord {
        FileRecord {
            id: "f1".into(),
            name: "syllabus.pdf".into(),
            relative_path: String::new(),
            media_type: "application/pdf".into(),
            size_bytes: 4,
            content: "data:application/pdf;base64,JVBERg==".into(),
            preview_content: None,
        }
    }

    #[test]
    fn test_request_serializes_with_provider_field_names() {
        let request = ChatRequest::build("What is week 2 about?", &[pdf()], &[], "be precise");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be precise");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["data"], "JVBERg==");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "What is week 2 about?");
        assert_eq!(json["generationConfig"]["thinkingConfig"]["thinkingBudget"], 2048);
        let temperature = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.4).abs() < 1e-6);
        let top_p = json["generationConfig"]["topP"].as_f64().unwrap();
        assert!((top_p - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_assistant_history_maps_to_model_role() {
        let history = vec![
            message(1, Role::User, "hi"),
            message(2, Role::Assistant, "hello"),
        ];
        let request = ChatRequest::build("next", &[], &history, "x");
        let turns = request.history();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Some(TurnRole::User));
        assert_eq!(turns[1].role, Some(TurnRole::Model));
        assert_eq!(turns[1].parts, vec![Part::text("hello")]);
    }

    #[test]
    fn test_history_window_keeps_the_most_recent_messages() {
        let history: Vec<ChatMessage> = (0..9)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                message(i, role, &format!("m{i}"))
            })
            .collect();
        let request = ChatRequest::build("next", &[], &history, "x");
        let texts: Vec<&str> = request
            .history()
            .iter()
            .filter_map(|c| c.parts[0].as_text())
            .collect();
        assert_eq!(texts, vec!["m3", "m4", "m5", "m6", "m7", "m8"]);
    }
}
