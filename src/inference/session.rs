//! # Chat Session
//!
//! A conversational context against one backend: fixed model, system
//! instruction and sampling settings, plus the turn history built up so far.
//!
//! The backend delivers deltas; the session folds them into cumulative text
//! and hands every intermediate result to the caller's callback. A callback
//! invocation is therefore always a full replacement of what was shown before.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::inference::{ChatBackend, GenerationConfig, ProviderError, StreamChunk, Turn, TurnRequest};

/// Capacity of the backend → session chunk channel.
const CHUNK_BUFFER: usize = 100;

/// Static settings a session is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub model: String,
    pub system_instruction: String,
    pub generation: GenerationConfig,
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    settings: SessionSettings,
    history: Vec<Turn>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: SessionSettings) -> Self {
        info!(
            "New chat session: backend={}, model={}, temperature={}, max_output_tokens={}",
            backend.name(),
            settings.model,
            settings.generation.temperature,
            settings.generation.max_output_tokens
        );
        Self {
            backend,
            settings,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Sends `message` as the next user turn and streams the reply.
    ///
    /// `on_chunk` receives the cumulative reply text after every non-empty
    /// delta, in delivery order. Returns the final text. The exchange is only
    /// recorded in the history when the stream succeeds.
    pub async fn send_streaming<F>(&mut self, message: &str, mut on_chunk: F) -> Result<String, ProviderError>
    where
        F: FnMut(&str) + Send,
    {
        let (tx, mut rx) = mpsc::channel::<StreamChunk>(CHUNK_BUFFER);
        let backend = self.backend.clone();

        let request = TurnRequest {
            model: &self.settings.model,
            system_instruction: &self.settings.system_instruction,
            generation: self.settings.generation,
            history: &self.history,
            message,
        };

        debug!(
            "Sending turn {} ({} bytes) with {} prior turns",
            self.history.len() / 2 + 1,
            message.len(),
            self.history.len()
        );

        let stream = backend.stream_turn(request, tx);
        let collect = async {
            let mut full = String::new();
            let mut chunk_count = 0usize;
            while let Some(chunk) = rx.recv().await {
                match chunk {
                    StreamChunk::Text(delta) => {
                        if delta.is_empty() {
                            continue;
                        }
                        chunk_count += 1;
                        full.push_str(&delta);
                        on_chunk(&full);
                    }
                    StreamChunk::Completed { finish_reason } => {
                        match finish_reason.as_deref() {
                            None | Some("STOP") => {
                                debug!("Reply completed after {chunk_count} chunks")
                            }
                            Some(other) => {
                                warn!("Reply finished early ({other}) after {chunk_count} chunks")
                            }
                        }
                    }
                }
            }
            full
        };

        let (result, full) = futures::join!(stream, collect);
        result?;

        self.history.push(Turn::user(message));
        self.history.push(Turn::model(full.clone()));
        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedBackend, test_settings};

    #[tokio::test]
    async fn callback_sees_cumulative_text() {
        let backend = Arc::new(ScriptedBackend::replying(&["Hi", " there", "!"]));
        let mut session = ChatSession::new(backend, test_settings());

        let mut seen = Vec::new();
        let full = session
            .send_streaming("Hello", |text| seen.push(text.to_string()))
            .await
            .unwrap();

        assert_eq!(seen, vec!["Hi", "Hi there", "Hi there!"]);
        assert_eq!(full, "Hi there!");
    }

    #[tokio::test]
    async fn empty_deltas_do_not_trigger_callback() {
        let backend = Arc::new(ScriptedBackend::replying(&["", "a", "", "b"]));
        let mut session = ChatSession::new(backend, test_settings());

        let mut calls = 0;
        session.send_streaming("q", |_| calls += 1).await.unwrap();
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn successful_turns_are_recorded_in_history() {
        let backend = Arc::new(ScriptedBackend::replying(&["answer"]));
        let mut session = ChatSession::new(backend.clone(), test_settings());

        session.send_streaming("first", |_| {}).await.unwrap();
        session.send_streaming("second", |_| {}).await.unwrap();

        assert_eq!(
            session.history(),
            &[
                Turn::user("first"),
                Turn::model("answer"),
                Turn::user("second"),
                Turn::model("answer"),
            ]
        );
        // The second request carried the first exchange as history.
        assert_eq!(backend.seen_history_lens(), vec![0, 2]);
    }

    #[tokio::test]
    async fn failed_turn_leaves_history_untouched() {
        let backend = Arc::new(ScriptedBackend::failing_after(
            &["partial"],
            ProviderError::Network("reset".into()),
        ));
        let mut session = ChatSession::new(backend, test_settings());

        let mut seen = Vec::new();
        let err = session
            .send_streaming("q", |text| seen.push(text.to_string()))
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::Network("reset".into()));
        assert_eq!(seen, vec!["partial"]);
        assert!(session.history().is_empty());
    }
}
