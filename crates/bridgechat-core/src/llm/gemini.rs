use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde::Deserialize;

use crate::constants::{defaults, endpoints, generation};
use crate::error::BridgeError;
use crate::ingest::FileRecord;
use crate::llm::traits::*;
use crate::state::ChatMessage;

pub struct GeminiClient {
    client: reqwest::Client,
    api_key_env: String,
    api_key: Option<String>,
    model: String,
    base_url: String,
    system_instruction: String,
}

impl GeminiClient {
    /// `api_key_env` names the variable the key is read from on every request.
    pub fn new(api_key_env: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key_env: api_key_env.into(),
            api_key: None,
            model: defaults::MODEL.to_string(),
            base_url: endpoints::GEMINI_BASE_URL.to_string(),
            system_instruction: generation::SYSTEM_INSTRUCTION.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Use a fixed key instead of the environment.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.is_empty())
    }
}

impl ChatBackend for GeminiClient {
    fn stream_reply(
        &self,
        prompt: &str,
        files: &[FileRecord],
        history: &[ChatMessage],
    ) -> FragmentStream {
        let body = ChatRequest::build(prompt, files, history, &self.system_instruction);
        let client = self.client.clone();
        let url = self.endpoint();
        let api_key = self.resolve_api_key();
        let api_key_env = self.api_key_env.clone();

        tracing::debug!(
            "Gemini request: model={} turns={} attachments={}",
            self.model,
            body.contents.len(),
            files.len()
        );

        let opened = async move {
            let api_key = match api_key {
                Some(key) => key,
                None => {
                    tracing::error!("Gemini API key missing: set {}", api_key_env);
                    return Err(BridgeError::provider_unavailable());
                }
            };
            open_event_stream(client, url, api_key, body).await
        };

        stream::once(opened)
            .flat_map(|opened| match opened {
                Ok(bytes) => decode_event_stream(bytes),
                Err(e) => stream::iter([Err::<String, BridgeError>(e)]).boxed(),
            })
            .boxed()
    }
}

type ByteStream = BoxStream<'static, Result<Vec<u8>, BridgeError>>;

async fn open_event_stream(
    client: reqwest::Client,
    url: String,
    api_key: String,
    body: ChatRequest,
) -> Result<ByteStream, BridgeError> {
    let response = client
        .post(&url)
        .header(endpoints::API_KEY_HEADER, api_key)
        .header("content-type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Gemini request failed: {}", e);
            BridgeError::provider_unavailable()
        })?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::error!("Gemini API error ({}): {}", status, text);
        return Err(BridgeError::provider_unavailable());
    }

    Ok(response
        .bytes_stream()
        .map(|chunk| chunk.map(|b| b.to_vec()).map_err(BridgeError::from))
        .boxed())
}

/// What one SSE line contributed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LineEvent {
    Text(String),
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Interpret one line of the event stream. Non-data lines, keep-alives and
/// chunks without answer text yield `None`.
pub(crate) fn parse_event_line(line: &str) -> Option<LineEvent> {
    let data = line.trim().strip_prefix("data:")?.trim_start();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(c) => c,
        Err(e) => return Some(LineEvent::Failed(format!("malformed chunk: {e}"))),
    };

    if let Some(error) = chunk.error {
        return Some(LineEvent::Failed(error.message));
    }

    let text: String = chunk
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        None
    } else {
        Some(LineEvent::Text(text))
    }
}

struct DecodeState {
    bytes: ByteStream,
    buffer: Vec<u8>,
    done: bool,
}

/// Turn raw SSE bytes into text fragments. Lines are split on raw bytes so a
/// multi-byte character spanning two network chunks stays intact.
pub(crate) fn decode_event_stream(bytes: ByteStream) -> FragmentStream {
    let initial = DecodeState {
        bytes,
        buffer: Vec::new(),
        done: false,
    };

    stream::unfold(initial, |mut state| async move {
        loop {
            if state.done {
                return None;
            }

            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                match parse_event_line(&String::from_utf8_lossy(&line)) {
                    Some(LineEvent::Text(text)) => return Some((Ok(text), state)),
                    Some(LineEvent::Failed(reason)) => {
                        tracing::error!("Gemini stream error: {}", reason);
                        state.done = true;
                        return Some((Err(BridgeError::provider_unavailable()), state));
                    }
                    None => continue,
                }
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    tracing::error!("Gemini stream interrupted: {}", e);
                    state.done = true;
                    return Some((Err(BridgeError::provider_unavailable()), state));
                }
                None => {
                    state.done = true;
                    let rest = std::mem::take(&mut state.buffer);
                    match parse_event_line(&String::from_utf8_lossy(&rest)) {
                        Some(LineEvent::Text(text)) => return Some((Ok(text), state)),
                        Some(LineEvent::Failed(reason)) => {
                            tracing::error!("Gemini stream error: {}", reason);
                            return Some((Err(BridgeError::provider_unavailable()), state));
                        }
                        None => return None,
                    }
                }
            }
        }
    })
    .boxed()
}
