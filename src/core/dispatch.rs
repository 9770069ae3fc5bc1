//! # Turn Driver
//!
//! The async half of a turn. Runs the transport call for one submission and
//! reports progress back to the event loop as `Action`s:
//!
//! ```text
//! TurnStarted ─▶ ReplyChunk* ─▶ ReplyDone | ReplyFailed
//! ```
//!
//! Exactly one of `ReplyDone` / `ReplyFailed` is sent per turn, so the loading
//! state is always cleared.

use std::sync::{Arc, mpsc};

use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::core::action::Action;
use crate::inference::ChatTransport;

pub async fn drive_turn(
    transport: Arc<Mutex<ChatTransport>>,
    prompt: String,
    reply_id: String,
    tx: mpsc::Sender<Action>,
) {
    let mut transport = transport.lock().await;
    info!("Turn {reply_id} started ({} bytes)", prompt.len());
    forward(
        &tx,
        Action::TurnStarted {
            reply_id: reply_id.clone(),
        },
    );

    let chunk_tx = tx.clone();
    let chunk_id = reply_id.clone();
    let result = transport
        .send_streaming(&prompt, move |text| {
            debug!("Forwarding Action::ReplyChunk (total={})", text.len());
            forward(
                &chunk_tx,
                Action::ReplyChunk {
                    reply_id: chunk_id.clone(),
                    text: text.to_string(),
                },
            );
        })
        .await;

    let settle = match result {
        Ok(text) => {
            info!("Turn {reply_id} finished ({} bytes)", text.len());
            Action::ReplyDone { reply_id }
        }
        Err(e) => Action::ReplyFailed {
            reply_id,
            error: e.to_string(),
        },
    };
    forward(&tx, settle);
}

fn forward(tx: &mpsc::Sender<Action>, action: Action) {
    if tx.send(action).is_err() {
        warn!("Failed to forward turn action: receiver dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ProviderError;
    use crate::test_support::{ScriptedBackend, ScriptedConnector, test_settings};

    fn shared(connector: ScriptedConnector) -> Arc<Mutex<ChatTransport>> {
        Arc::new(Mutex::new(ChatTransport::new(
            Box::new(connector),
            test_settings(),
        )))
    }

    #[tokio::test]
    async fn successful_turn_emits_started_chunks_done() {
        let transport = shared(ScriptedConnector::with(ScriptedBackend::replying(&[
            "a", "b",
        ])));
        let (tx, rx) = mpsc::channel();

        drive_turn(transport, "q".into(), "42".into(), tx).await;

        let actions: Vec<Action> = rx.try_iter().collect();
        assert_eq!(
            actions,
            vec![
                Action::TurnStarted {
                    reply_id: "42".into()
                },
                Action::ReplyChunk {
                    reply_id: "42".into(),
                    text: "a".into()
                },
                Action::ReplyChunk {
                    reply_id: "42".into(),
                    text: "ab".into()
                },
                Action::ReplyDone {
                    reply_id: "42".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_turn_ends_with_exactly_one_failure() {
        let transport = shared(ScriptedConnector::with(ScriptedBackend::failing_after(
            &["x"],
            ProviderError::Network("reset".into()),
        )));
        let (tx, rx) = mpsc::channel();

        drive_turn(transport, "q".into(), "7".into(), tx).await;

        let actions: Vec<Action> = rx.try_iter().collect();
        let settles = actions
            .iter()
            .filter(|a| matches!(a, Action::ReplyDone { .. } | Action::ReplyFailed { .. }))
            .count();
        assert_eq!(settles, 1);
        assert!(matches!(
            actions.last(),
            Some(Action::ReplyFailed { reply_id, error }) if reply_id == "7" && error.contains("reset")
        ));
    }

    #[tokio::test]
    async fn missing_credential_fails_the_turn() {
        let transport = shared(ScriptedConnector::unavailable());
        let (tx, rx) = mpsc::channel();

        drive_turn(transport, "q".into(), "1".into(), tx).await;

        let actions: Vec<Action> = rx.try_iter().collect();
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[1], Action::ReplyFailed { .. }));
    }
}
