//! # Actions
//!
//! Everything that can happen in the app becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The model streams more text? That's `Action::ReplyChunk { .. }`.
//!
//! The `update()` function takes the current state and an action,
//! mutates the state and returns an `Effect` describing any I/O to start.
//! No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! A turn moves through:
//!
//! ```text
//! Idle ──Submit/SelectTopic──▶ Submitting ──TurnStarted──▶ Streaming
//!   ▲                                                      │
//!   └──────────────── ReplyDone / ReplyFailed ◀────────────┘
//! ```

use log::{debug, error, info, warn};

use crate::core::conversation::INIT_ERROR_ID;
use crate::core::state::{App, TurnPhase, now_ms};
use crate::core::topics;

/// Shown in place of any failure detail when a turn fails.
pub const REPLY_ERROR_TEXT: &str =
    "I encountered an error connecting to the architecture engine. Please try again.";

/// Shown once when the session cannot be created at startup.
pub const MISSING_KEY_TEXT: &str =
    "Error: API key is missing. Please check your environment variables.";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// User submitted text from the input box.
    Submit(String),
    /// User picked a catalog topic; behaves like submitting its prompt.
    SelectTopic(String),
    /// The transport call for the turn has begun.
    TurnStarted { reply_id: String },
    /// Cumulative reply text so far.
    ReplyChunk { reply_id: String, text: String },
    ReplyDone { reply_id: String },
    /// `error` is logged, never shown.
    ReplyFailed { reply_id: String, error: String },
    /// The session could not be created at startup.
    InitFailed(String),
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Start a turn sending `prompt`; its reply goes into `reply_id`.
    SpawnTurn { prompt: String, reply_id: String },
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => submit(app, text),
        Action::SelectTopic(id) => match topics::find(&id) {
            Some(topic) => {
                info!("Topic selected: {}", topic.id);
                submit(app, topic.prompt.to_string())
            }
            None => {
                warn!("Unknown topic id: {id}");
                Effect::None
            }
        },
        Action::TurnStarted { reply_id } => {
            if app.phase
                == (TurnPhase::Submitting {
                    reply_id: reply_id.clone(),
                })
            {
                app.phase = TurnPhase::Streaming { reply_id };
                app.status_message = String::from("Streaming...");
            } else {
                debug!("Ignoring TurnStarted for inactive reply {reply_id}");
            }
            Effect::None
        }
        Action::ReplyChunk { reply_id, text } => {
            if app.active_reply_id() != Some(reply_id.as_str()) {
                debug!("Dropping chunk for inactive reply {reply_id}");
                return Effect::None;
            }
            if !app.conversation.replace_text(&reply_id, &text) {
                warn!("Reply placeholder {reply_id} is missing or no longer streaming");
            }
            if matches!(app.phase, TurnPhase::Submitting { .. }) {
                app.phase = TurnPhase::Streaming { reply_id };
            }
            Effect::None
        }
        Action::ReplyDone { reply_id } => {
            app.conversation.finish_streaming(&reply_id);
            if app.active_reply_id() == Some(reply_id.as_str()) {
                info!("Turn {reply_id} complete");
                app.phase = TurnPhase::Idle;
                app.status_message = String::from("Ready");
            }
            Effect::None
        }
        Action::ReplyFailed { reply_id, error } => {
            error!("Turn {reply_id} failed: {error}");
            app.conversation.finish_streaming(&reply_id);
            if app.active_reply_id() == Some(reply_id.as_str()) {
                app.conversation
                    .push_ai(REPLY_ERROR_TEXT.to_string(), now_ms());
                app.phase = TurnPhase::Idle;
                app.status_message = String::from("Request failed");
            }
            Effect::None
        }
        Action::InitFailed(detail) => {
            warn!("Chat session unavailable at startup: {detail}");
            if app
                .conversation
                .push_notice(INIT_ERROR_ID, MISSING_KEY_TEXT, now_ms())
            {
                app.status_message = String::from("API key missing");
            }
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}

fn submit(app: &mut App, text: String) -> Effect {
    if text.trim().is_empty() {
        return Effect::None;
    }
    if app.is_loading() {
        debug!("Ignoring submission while a turn is outstanding");
        return Effect::None;
    }

    let now = now_ms();
    app.conversation.push_user(text.clone(), now);
    let reply_id = app.conversation.push_placeholder(now);
    debug!("Submitted {} bytes, reply placeholder {reply_id}", text.len());

    app.phase = TurnPhase::Submitting {
        reply_id: reply_id.clone(),
    };
    app.status_message = String::from("Thinking...");
    Effect::SpawnTurn {
        prompt: text,
        reply_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::{Sender, WELCOME_ID};
    use crate::test_support::test_app;

    fn spawn_reply_id(effect: Effect) -> String {
        match effect {
            Effect::SpawnTurn { reply_id, .. } => reply_id,
            other => panic!("expected SpawnTurn, got {other:?}"),
        }
    }

    #[test]
    fn submit_appends_user_message_and_placeholder() {
        let mut app = test_app();
        let effect = update(&mut app, Action::Submit("How do I start?".into()));

        let reply_id = match effect {
            Effect::SpawnTurn { prompt, reply_id } => {
                assert_eq!(prompt, "How do I start?");
                reply_id
            }
            other => panic!("expected SpawnTurn, got {other:?}"),
        };

        let msgs = app.conversation.messages();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1].sender, Sender::User);
        assert_eq!(msgs[1].text, "How do I start?");
        assert_eq!(msgs[2].id, reply_id);
        assert_eq!(msgs[2].sender, Sender::Ai);
        assert!(msgs[2].text.is_empty());
        assert!(msgs[2].is_streaming);
        assert!(app.is_loading());
    }

    #[test]
    fn blank_submission_is_ignored() {
        let mut app = test_app();
        for text in ["", "   ", "\n\t"] {
            assert_eq!(update(&mut app, Action::Submit(text.into())), Effect::None);
        }
        assert_eq!(app.conversation.messages().len(), 1);
        assert!(!app.is_loading());
    }

    #[test]
    fn submission_while_loading_is_ignored() {
        let mut app = test_app();
        update(&mut app, Action::Submit("first".into()));
        let before = app.conversation.messages().len();

        assert_eq!(update(&mut app, Action::Submit("second".into())), Effect::None);
        assert_eq!(
            update(&mut app, Action::SelectTopic("db-strategy".into())),
            Effect::None
        );
        assert_eq!(app.conversation.messages().len(), before);
    }

    #[test]
    fn select_topic_submits_its_prompt() {
        let mut app = test_app();
        let effect = update(&mut app, Action::SelectTopic("setup-basics".into()));
        let expected = topics::find("setup-basics").unwrap().prompt;

        match effect {
            Effect::SpawnTurn { prompt, .. } => assert_eq!(prompt, expected),
            other => panic!("expected SpawnTurn, got {other:?}"),
        }
        assert_eq!(app.conversation.messages()[1].text, expected);
    }

    #[test]
    fn unknown_topic_is_ignored() {
        let mut app = test_app();
        assert_eq!(
            update(&mut app, Action::SelectTopic("nope".into())),
            Effect::None
        );
        assert_eq!(app.conversation.messages().len(), 1);
    }

    #[test]
    fn chunks_replace_placeholder_text() {
        let mut app = test_app();
        let reply_id = spawn_reply_id(update(&mut app, Action::Submit("q".into())));
        update(
            &mut app,
            Action::TurnStarted {
                reply_id: reply_id.clone(),
            },
        );
        assert_eq!(
            app.phase,
            TurnPhase::Streaming {
                reply_id: reply_id.clone()
            }
        );

        for text in ["Use", "Use stancl", "Use stancl/tenancy"] {
            update(
                &mut app,
                Action::ReplyChunk {
                    reply_id: reply_id.clone(),
                    text: text.into(),
                },
            );
        }
        let reply = app.conversation.get(&reply_id).unwrap();
        assert_eq!(reply.text, "Use stancl/tenancy");
        assert!(reply.is_streaming);
    }

    #[test]
    fn done_clears_streaming_and_loading() {
        let mut app = test_app();
        let reply_id = spawn_reply_id(update(&mut app, Action::Submit("q".into())));
        update(
            &mut app,
            Action::ReplyChunk {
                reply_id: reply_id.clone(),
                text: "answer".into(),
            },
        );
        update(
            &mut app,
            Action::ReplyDone {
                reply_id: reply_id.clone(),
            },
        );

        assert!(!app.is_loading());
        assert_eq!(app.conversation.streaming_count(), 0);
        assert_eq!(app.conversation.get(&reply_id).unwrap().text, "answer");
    }

    #[test]
    fn failure_keeps_partial_text_and_appends_error() {
        let mut app = test_app();
        let reply_id = spawn_reply_id(update(&mut app, Action::Submit("q".into())));
        update(
            &mut app,
            Action::ReplyChunk {
                reply_id: reply_id.clone(),
                text: "partial".into(),
            },
        );
        update(
            &mut app,
            Action::ReplyFailed {
                reply_id: reply_id.clone(),
                error: "network error: reset".into(),
            },
        );

        assert!(!app.is_loading());
        let msgs = app.conversation.messages();
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[2].text, "partial");
        assert!(!msgs[2].is_streaming);
        assert_eq!(msgs[3].text, REPLY_ERROR_TEXT);
        assert_eq!(msgs[3].sender, Sender::Ai);
        assert!(!msgs.iter().any(|m| m.text.contains("reset")));
    }

    #[test]
    fn stale_chunks_are_dropped() {
        let mut app = test_app();
        let first = spawn_reply_id(update(&mut app, Action::Submit("q".into())));
        update(
            &mut app,
            Action::ReplyDone {
                reply_id: first.clone(),
            },
        );

        update(
            &mut app,
            Action::ReplyChunk {
                reply_id: first.clone(),
                text: "late".into(),
            },
        );
        assert!(app.conversation.get(&first).unwrap().text.is_empty());
        assert!(!app.is_loading());
    }

    #[test]
    fn init_failure_appends_one_notice_and_keeps_input_enabled() {
        let mut app = test_app();
        update(&mut app, Action::InitFailed("no key".into()));
        update(&mut app, Action::InitFailed("no key".into()));

        let msgs = app.conversation.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].id, WELCOME_ID);
        assert_eq!(msgs[1].id, INIT_ERROR_ID);
        assert_eq!(msgs[1].text, MISSING_KEY_TEXT);
        assert!(!app.is_loading());
    }

    #[test]
    fn quit_returns_quit_effect() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
