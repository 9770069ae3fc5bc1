//! # Chat Transport
//!
//! Owns the single [`ChatSession`] the app talks through.
//!
//! ```text
//! initialize()      ── Connector::connect() ──▶ fresh ChatSession (old history dropped)
//! ensure_session()  ── existing session, or initialize() on demand
//! send_streaming()  ── ensure_session() ▶ ChatSession::send_streaming()
//! ```
//!
//! `ensure_session()` only creates a session when none exists. Once one
//! exists it is kept until the next explicit `initialize()`, including after
//! a failed send, so the remote context is never silently reset
//! mid-conversation.

use std::fmt;
use std::sync::Arc;

use log::{info, warn};

use crate::inference::session::{ChatSession, SessionSettings};
use crate::inference::{ChatBackend, GeminiProvider, ProviderError};

#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The credential needed to reach the service is missing.
    Configuration(String),
    /// No session existed at send time and creating one failed.
    Session(Box<TransportError>),
    /// Anything that went wrong during the streaming exchange.
    RemoteService(ProviderError),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            TransportError::Session(cause) => {
                write!(f, "failed to initialize chat session: {cause}")
            }
            TransportError::RemoteService(e) => write!(f, "remote service error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Session(cause) => Some(cause.as_ref()),
            TransportError::RemoteService(e) => Some(e),
            TransportError::Configuration(_) => None,
        }
    }
}

impl From<ProviderError> for TransportError {
    fn from(e: ProviderError) -> Self {
        TransportError::RemoteService(e)
    }
}

/// Produces the backend a new session talks to.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn ChatBackend>, TransportError>;
}

/// Connects to Gemini using the configured API key.
pub struct GeminiConnector {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl GeminiConnector {
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
        Self { api_key, base_url }
    }
}

impl Connector for GeminiConnector {
    fn connect(&self) -> Result<Arc<dyn ChatBackend>, TransportError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Arc::new(GeminiProvider::new(
                key.to_string(),
                self.base_url.clone(),
            ))),
            _ => Err(TransportError::Configuration(
                "API key is not set (GEMINI_API_KEY, API_KEY, or [gemini] api_key)".to_string(),
            )),
        }
    }
}

pub struct ChatTransport {
    connector: Box<dyn Connector>,
    settings: SessionSettings,
    session: Option<ChatSession>,
}

impl ChatTransport {
    pub fn new(connector: Box<dyn Connector>, settings: SessionSettings) -> Self {
        Self {
            connector,
            settings,
            session: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// Creates a fresh session, replacing (and forgetting) any existing one.
    ///
    /// On failure the previous session, if any, is kept.
    pub fn initialize(&mut self) -> Result<(), TransportError> {
        let session = self.open()?;
        if self.session.is_some() {
            warn!("Re-initializing chat session; previous turn history is discarded");
        }
        self.session = Some(session);
        Ok(())
    }

    /// Returns the current session, creating one if none exists yet.
    pub fn ensure_session(&mut self) -> Result<&mut ChatSession, TransportError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                info!("No chat session yet, initializing before send");
                self.open()
                    .map_err(|e| TransportError::Session(Box::new(e)))?
            }
        };
        Ok(self.session.insert(session))
    }

    fn open(&self) -> Result<ChatSession, TransportError> {
        let backend = self.connector.connect()?;
        Ok(ChatSession::new(backend, self.settings.clone()))
    }

    /// Sends `message` and streams the reply; `on_chunk` gets cumulative text.
    pub async fn send_streaming<F>(&mut self, message: &str, on_chunk: F) -> Result<String, TransportError>
    where
        F: FnMut(&str) + Send,
    {
        let session = self.ensure_session()?;
        let text = session.send_streaming(message, on_chunk).await?;
        Ok(text)
    }
}
