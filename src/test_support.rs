//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::core::state::App;
use crate::core::topics::SYSTEM_INSTRUCTION;
use crate::inference::{
    ChatBackend, Connector, GenerationConfig, ProviderError, SessionSettings, StreamChunk,
    TransportError, TurnRequest,
};

/// A backend that replays a fixed list of deltas, optionally failing afterwards.
pub struct ScriptedBackend {
    deltas: Vec<String>,
    failure: Option<ProviderError>,
    history_lens: Mutex<Vec<usize>>,
}

impl ScriptedBackend {
    pub fn replying(deltas: &[&str]) -> Self {
        Self {
            deltas: deltas.iter().map(|d| d.to_string()).collect(),
            failure: None,
            history_lens: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_after(deltas: &[&str], error: ProviderError) -> Self {
        Self {
            failure: Some(error),
            ..Self::replying(deltas)
        }
    }

    /// History length carried by each request received so far.
    pub fn seen_history_lens(&self) -> Vec<usize> {
        self.history_lens.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_turn(
        &self,
        request: TurnRequest<'_>,
        sender: Sender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        self.history_lens
            .lock()
            .unwrap()
            .push(request.history.len());

        for delta in &self.deltas {
            sender
                .send(StreamChunk::Text(delta.clone()))
                .await
                .map_err(|_| ProviderError::ChannelClosed)?;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        sender
            .send(StreamChunk::Completed {
                finish_reason: Some("STOP".to_string()),
            })
            .await
            .map_err(|_| ProviderError::ChannelClosed)?;
        Ok(())
    }
}

/// A connector handing out one shared backend, or none at all.
pub struct ScriptedConnector {
    backend: Option<Arc<ScriptedBackend>>,
    connects: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn with(backend: ScriptedBackend) -> Self {
        Self {
            backend: Some(Arc::new(backend)),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Behaves like a missing credential.
    pub fn unavailable() -> Self {
        Self {
            backend: None,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counts successful connections.
    pub fn connect_count(&self) -> Arc<AtomicUsize> {
        self.connects.clone()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self) -> Result<Arc<dyn ChatBackend>, TransportError> {
        match &self.backend {
            Some(backend) => {
                self.connects.fetch_add(1, Ordering::SeqCst);
                let backend: Arc<dyn ChatBackend> = backend.clone();
                Ok(backend)
            }
            None => Err(TransportError::Configuration("no API key".to_string())),
        }
    }
}

pub fn test_settings() -> SessionSettings {
    SessionSettings {
        model: "test-model".to_string(),
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        generation: GenerationConfig::default(),
    }
}

/// Creates a test App with the welcome message only.
pub fn test_app() -> App {
    App::new("test-model".to_string())
}
