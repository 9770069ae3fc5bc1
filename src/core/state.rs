//! # Application State
//!
//! Core business state. This module contains domain logic only,
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── conversation: Conversation   // messages shown in the chat view
//! ├── phase: TurnPhase             // Idle / Submitting / Streaming
//! ├── status_message: String       // status bar text
//! └── model_name: String           // model the session talks to
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use crate::core::conversation::Conversation;

/// Where the current exchange is. At most one turn is ever outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    /// User message and placeholder appended, transport call not yet begun.
    Submitting { reply_id: String },
    /// Transport call in flight; chunks overwrite the placeholder.
    Streaming { reply_id: String },
}

pub struct App {
    pub conversation: Conversation,
    pub phase: TurnPhase,
    pub status_message: String,
    pub model_name: String,
}

impl App {
    pub fn new(model_name: String) -> Self {
        Self {
            conversation: Conversation::new(now_ms()),
            phase: TurnPhase::Idle,
            status_message: String::from("Ready"),
            model_name,
        }
    }

    /// True from submission until the turn settles; the input box is disabled.
    pub fn is_loading(&self) -> bool {
        self.phase != TurnPhase::Idle
    }

    /// The placeholder id of the outstanding turn, if any.
    pub fn active_reply_id(&self) -> Option<&str> {
        match &self.phase {
            TurnPhase::Idle => None,
            TurnPhase::Submitting { reply_id } | TurnPhase::Streaming { reply_id } => {
                Some(reply_id)
            }
        }
    }
}

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
