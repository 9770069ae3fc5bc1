//! # Conversation
//!
//! The ordered transcript shown in the chat view.
//!
//! ```text
//! Conversation
//! ├── messages: Vec<Message>   // insertion order == display order
//! └── last_id: i64             // last timestamp-derived id handed out
//! ```
//!
//! The list is append-only. The one exception is the AI reply currently
//! streaming in: its `text` is overwritten wholesale with every chunk, and its
//! `is_streaming` flag is cleared once the turn settles. User messages are
//! never touched after creation.

use serde::{Deserialize, Serialize};

/// Fixed id of the greeting that always sits at position 0.
pub const WELCOME_ID: &str = "welcome";
/// Fixed id of the message appended when the session cannot start.
pub const INIT_ERROR_ID: &str = "error-init";

pub const WELCOME_TEXT: &str = "Hello! I'm your Laravel Tenancy Architect. I can help you design \
    multi-tenant systems, choose the right package, or write migration strategies. \
    What are you building today?";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub is_streaming: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
    last_id: i64,
}

impl Conversation {
    /// Starts a conversation holding only the welcome message.
    pub fn new(now_ms: i64) -> Self {
        Self {
            messages: vec![Message {
                id: WELCOME_ID.to_string(),
                text: WELCOME_TEXT.to_string(),
                sender: Sender::Ai,
                timestamp: now_ms,
                is_streaming: false,
            }],
            last_id: i64::MIN,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages currently flagged as streaming (0 or 1).
    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_streaming).count()
    }

    /// Derives a fresh id from the creation timestamp.
    ///
    /// Two messages created in the same millisecond get consecutive ids,
    /// so ids stay unique and increasing.
    fn next_id(&mut self, now_ms: i64) -> String {
        let id = if now_ms > self.last_id {
            now_ms
        } else {
            self.last_id + 1
        };
        self.last_id = id;
        id.to_string()
    }

    fn push(&mut self, id: String, text: String, sender: Sender, now_ms: i64, is_streaming: bool) -> &Message {
        let index = self.messages.len();
        self.messages.push(Message {
            id,
            text,
            sender,
            timestamp: now_ms,
            is_streaming,
        });
        &self.messages[index]
    }

    pub fn push_user(&mut self, text: String, now_ms: i64) -> &Message {
        let id = self.next_id(now_ms);
        self.push(id, text, Sender::User, now_ms, false)
    }

    pub fn push_ai(&mut self, text: String, now_ms: i64) -> &Message {
        let id = self.next_id(now_ms);
        self.push(id, text, Sender::Ai, now_ms, false)
    }

    /// Appends an empty AI message flagged as streaming and returns its id.
    ///
    /// Any previous streaming flag is cleared first so at most one message
    /// is ever streaming.
    pub fn push_placeholder(&mut self, now_ms: i64) -> String {
        for msg in self.messages.iter_mut().filter(|m| m.is_streaming) {
            msg.is_streaming = false;
        }
        let id = self.next_id(now_ms);
        self.push(id, String::new(), Sender::Ai, now_ms, true).id.clone()
    }

    /// Appends an AI message with a fixed id, unless one already exists.
    pub fn push_notice(&mut self, id: &str, text: &str, now_ms: i64) -> bool {
        if self.get(id).is_some() {
            return false;
        }
        self.push(id.to_string(), text.to_string(), Sender::Ai, now_ms, false);
        true
    }

    /// Overwrites the text of a streaming AI message (last write wins).
    ///
    /// Returns `false` when no streaming AI message has that id.
    pub fn replace_text(&mut self, id: &str, text: &str) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.sender == Sender::Ai && m.is_streaming)
        {
            Some(msg) => {
                msg.text.clear();
                msg.text.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Clears the streaming flag. Returns `false` if the message wasn't streaming.
    pub fn finish_streaming(&mut self, id: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id && m.is_streaming) {
            Some(msg) => {
                msg.is_streaming = false;
                true
            }
            None => false,
        }
    }
}
