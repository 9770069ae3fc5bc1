use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use super::types::{GenerationConfig, StreamChunk, Turn};

/// Errors that can occur during backend operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Backend misconfigured (missing API key, bad URL).
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused, dropped stream).
    Network(String),
    /// The service returned an error, either as a non-2xx status or inside the stream.
    Api { status: u16, message: String },
    /// Failed to build or parse a payload.
    Parse(String),
    /// The chunk receiver went away mid-stream.
    ChannelClosed,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Network(msg) => write!(f, "network error: {msg}"),
            ProviderError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ProviderError::Parse(msg) => write!(f, "parse error: {msg}"),
            ProviderError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Everything a backend needs to produce the next model turn.
pub struct TurnRequest<'a> {
    pub model: &'a str,
    pub system_instruction: &'a str,
    pub generation: GenerationConfig,
    /// Prior turns, oldest first. Does not include `message`.
    pub history: &'a [Turn],
    /// The new user turn.
    pub message: &'a str,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the name of the backend.
    fn name(&self) -> &str;

    /// Streams the reply to `request`, sending text deltas to the channel.
    async fn stream_turn(
        &self,
        request: TurnRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError>;
}
