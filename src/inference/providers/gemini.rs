//! Gemini backend using the `streamGenerateContent` endpoint.
//!
//! This module uses Gemini API terminology:
//! - "contents" (array of turns, roles `user` / `model`)
//! - "systemInstruction", "generationConfig"
//! - SSE `data:` payloads are `GenerateContentResponse` objects; each carries
//!   the next text delta in `candidates[0].content.parts[*].text`

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::inference::{
    ChatBackend, GenerationConfig, ProviderError, StreamChunk, Turn, TurnRequest, TurnRole,
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
struct Part {
    text: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// The request body for `models/{model}:streamGenerateContent`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: ApiGenerationConfig,
}

/// One streamed `GenerateContentResponse`. Only the fields we read.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct StreamEvent {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
    /// Set on reasoning summaries; these are not part of the answer.
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

// ============================================================================
// Translation Layer
// ============================================================================

fn role_name(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Model => "model",
    }
}

/// Builds the `contents` array: prior turns followed by the new user message.
fn build_contents(history: &[Turn], message: &str) -> Vec<Content> {
    history
        .iter()
        .map(|turn| Content {
            role: role_name(turn.role),
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        })
        .chain(std::iter::once(Content {
            role: "user",
            parts: vec![Part {
                text: message.to_string(),
            }],
        }))
        .collect()
}

fn build_request(request: &TurnRequest<'_>) -> GenerateContentRequest {
    let system_instruction = (!request.system_instruction.trim().is_empty()).then(|| {
        SystemInstruction {
            parts: vec![Part {
                text: request.system_instruction.to_string(),
            }],
        }
    });
    let GenerationConfig {
        temperature,
        max_output_tokens,
    } = request.generation;

    GenerateContentRequest {
        contents: build_contents(request.history, request.message),
        system_instruction,
        generation_config: ApiGenerationConfig {
            temperature,
            max_output_tokens,
        },
    }
}

/// What a single SSE payload contributes to the reply.
#[derive(Debug, Default, PartialEq)]
struct EventOutcome {
    text: String,
    finish_reason: Option<String>,
}

/// Interprets one `data:` payload.
///
/// Returns `Ok(None)` for payloads that can't be parsed (logged and skipped),
/// and an error when the service reports one inside the stream.
fn interpret_event(data: &str) -> Result<Option<EventOutcome>, ProviderError> {
    let event: StreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            warn!("Skipping unparseable Gemini event ({e}): {data}");
            return Ok(None);
        }
    };

    if let Some(err) = event.error {
        return Err(ProviderError::Api {
            status: err.code,
            message: err.message,
        });
    }

    let mut outcome = EventOutcome::default();

    if let Some(reason) = event.prompt_feedback.and_then(|f| f.block_reason) {
        warn!("Gemini blocked the prompt: {reason}");
        outcome.finish_reason = Some(reason);
    }

    if let Some(candidate) = event.candidates.into_iter().next() {
        if let Some(content) = candidate.content {
            for part in content.parts.into_iter().filter(|p| !p.thought) {
                if let Some(text) = part.text {
                    outcome.text.push_str(&text);
                }
            }
        }
        if candidate.finish_reason.is_some() {
            outcome.finish_reason = candidate.finish_reason;
        }
    }

    Ok(Some(outcome))
}

/// Running totals for one streamed reply.
#[derive(Default)]
struct StreamState {
    chunk_count: usize,
    total_len: usize,
    completed: bool,
}

/// Handles one SSE line, forwarding any text or completion to `sender`.
async fn forward_line(
    line: &str,
    sender: &Sender<StreamChunk>,
    state: &mut StreamState,
) -> Result<(), ProviderError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Ok(());
    }
    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
        debug!("Ignoring SSE line: {line}");
        return Ok(());
    };
    if data == "[DONE]" {
        return Ok(());
    }

    let Some(outcome) = interpret_event(data)? else {
        return Ok(());
    };

    if !outcome.text.is_empty() {
        state.chunk_count += 1;
        state.total_len += outcome.text.len();
        debug!(
            "Sending Text chunk (len={}, total={})",
            outcome.text.len(),
            state.total_len
        );
        sender
            .send(StreamChunk::Text(outcome.text))
            .await
            .map_err(|_| ProviderError::ChannelClosed)?;
    }

    if let Some(reason) = outcome.finish_reason
        && !state.completed
    {
        state.completed = true;
        info!(
            "Stream complete ({reason}): {} chunks, {} content bytes",
            state.chunk_count, state.total_len
        );
        sender
            .send(StreamChunk::Completed {
                finish_reason: Some(reason),
            })
            .await
            .map_err(|_| ProviderError::ChannelClosed)?;
    }
    Ok(())
}

// ============================================================================
// Backend Implementation
// ============================================================================

/// Google Gemini backend
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Creates a new Gemini backend.
    ///
    /// # Arguments
    /// * `api_key` - Gemini API key
    /// * `base_url` - Optional custom base URL (defaults to the public v1beta API)
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Posts the request and returns the (successful) streaming response.
    async fn send_request(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<reqwest::Response, ProviderError> {
        let json_body = serde_json::to_string(body)
            .map_err(|e| ProviderError::Parse(format!("Request serialization failed: {e}")))?;
        debug!("Gemini request body: {json_body}");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .body(json_body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        debug!("Gemini response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Gemini API error: {} - {}", status, err_body);
            let message = serde_json::from_str::<ErrorEnvelope>(&err_body)
                .map(|env| env.error.message)
                .unwrap_or(err_body);
            return Err(ProviderError::Api { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn stream_turn(
        &self,
        request: TurnRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        let body = build_request(&request);
        info!(
            "Gemini request: model={}, contents={}, temperature={}, max_output_tokens={}",
            request.model,
            body.contents.len(),
            request.generation.temperature,
            request.generation.max_output_tokens,
        );

        let response = self.send_request(request.model, &body).await?;

        // Buffer raw bytes so multi-byte characters split across network
        // chunks are decoded only once the whole line has arrived.
        let mut pending: Vec<u8> = Vec::new();
        let mut state = StreamState::default();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ProviderError::Network(e.to_string()))?;
            debug!("Raw chunk received: {} bytes", chunk.len());
            pending.extend_from_slice(&chunk);

            while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = pending.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&raw);
                forward_line(&line, &sender, &mut state).await?;
            }
        }

        if !pending.is_empty() {
            let line = String::from_utf8_lossy(&pending).into_owned();
            forward_line(&line, &sender, &mut state).await?;
        }

        if !state.completed {
            info!(
                "Stream ended without finish reason: {} chunks, {} content bytes",
                state.chunk_count, state.total_len
            );
            sender
                .send(StreamChunk::Completed {
                    finish_reason: None,
                })
                .await
                .map_err(|_| ProviderError::ChannelClosed)?;
        }
        Ok(())
    }
}
