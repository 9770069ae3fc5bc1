//! Terminal front end: owns the terminal, draws the screen and turns key
//! and mouse input into [`Action`]s for the reducer.
//!
//! The loop only redraws when something changed. While a reply is pending
//! it wakes every ~80ms so the spinner and the streaming border animate;
//! otherwise it blocks on input for up to 500ms.
//!
//! The cursor is a steady block. Every `draw()` repositions it, which
//! restarts a blinking cursor's timer and makes it flicker.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use log::{debug, info};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::layout::Rect;
use tokio::sync::Mutex;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::dispatch::drive_turn;
use crate::core::state::App;
use crate::core::topics::SYSTEM_INSTRUCTION;
use crate::inference::{ChatTransport, GeminiConnector, SessionSettings};
use crate::tui::component::EventHandler;
use crate::tui::components::sidebar::is_narrow;
use crate::tui::components::{
    InputBox, InputEvent, MessageListState, SidebarEvent, SidebarState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// View state that survives between frames. Nothing here is seen by the reducer.
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub sidebar: SidebarState,
    /// Streaming border breath, 0.0..=1.0
    pub pulse_value: f32,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            sidebar: SidebarState::new(),
            pulse_value: 0.0,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Needed to tell Shift+Enter from Enter; unsupported terminals ignore it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal input modes enabled");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Builds the transport and tries to open the chat session up front.
///
/// A failure is reported into the conversation; the transport stays
/// uninitialized and the first send retries.
pub fn build_transport(config: &ResolvedConfig, app: &mut App) -> ChatTransport {
    let connector = GeminiConnector::new(config.api_key.clone(), Some(config.base_url.clone()));
    let settings = SessionSettings {
        model: config.model_name.clone(),
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        generation: config.generation,
    };
    let mut transport = ChatTransport::new(Box::new(connector), settings);
    if let Err(e) = transport.initialize() {
        update(app, Action::InitFailed(e.to_string()));
    }
    transport
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut app = App::new(config.model_name.clone());
    let transport = Arc::new(Mutex::new(build_transport(&config, &mut app)));
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Turn tasks report back through here
    let (tx, rx) = mpsc::channel();

    let started = Instant::now();
    let mut dirty = true;

    'main: loop {
        let animating = app.is_loading();
        if dirty || animating {
            let elapsed = started.elapsed().as_secs_f32();
            tui.pulse_value = (elapsed * 5.0).sin() * 0.5 + 0.5;
            let spinner_frame = (elapsed * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            dirty = false;
        }

        let wait = Duration::from_millis(if animating { 80 } else { 500 });
        let first = poll_event_timeout(wait);
        dirty |= first.is_some();

        // Drain everything queued before drawing again
        let frame_area = terminal.get_frame().area();
        for event in first.into_iter().chain(std::iter::from_fn(poll_event_immediate)) {
            let mut dispatch = |action: Action, tui: &mut TuiState| {
                let effect = update(&mut app, action);
                apply_effect(effect, &transport, &tx, tui)
            };
            if route_event(event, &mut tui, frame_area, &mut dispatch) {
                break 'main;
            }
        }

        for action in rx.try_iter() {
            dirty = true;
            debug!("Turn action: {action:?}");
            let effect = apply_turn_action(&mut app, &mut tui, action);
            if apply_effect(effect, &transport, &tx, &mut tui) {
                break 'main;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

/// Sends one terminal event to whichever part of the screen owns it.
/// Returns true when the app should quit.
fn route_event<F>(event: TuiEvent, tui: &mut TuiState, frame_area: Rect, dispatch: &mut F) -> bool
where
    F: FnMut(Action, &mut TuiState) -> bool,
{
    let narrow = is_narrow(frame_area.width);
    match event {
        TuiEvent::Resize => false,
        TuiEvent::ForceQuit => dispatch(Action::Quit, tui),
        TuiEvent::ToggleSidebar => {
            if narrow {
                tui.sidebar.toggle();
            } else {
                tui.sidebar.focused = !tui.sidebar.focused;
            }
            false
        }
        TuiEvent::MouseMove(column, row) => {
            let messages = current_areas(tui, frame_area).messages;
            tui.message_list.hover(column, row, messages);
            false
        }
        TuiEvent::MouseClick(..) => match tui.sidebar.handle_event(&event) {
            Some(SidebarEvent::Select(id)) => select_topic(id, tui, narrow, dispatch),
            _ => false,
        },
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::ScrollToBottom => {
            tui.message_list.handle_event(&event);
            false
        }
        TuiEvent::FocusNext if !tui.sidebar.focused => {
            if narrow && !tui.sidebar.open {
                tui.sidebar.toggle();
            } else {
                tui.sidebar.focused = true;
            }
            false
        }
        // Typing while the topic list has focus goes back to the input
        TuiEvent::InputChar(_) | TuiEvent::Paste(_) if tui.sidebar.focused => {
            tui.sidebar.focused = false;
            tui.input_box.handle_event(&event);
            false
        }
        _ if tui.sidebar.focused => match tui.sidebar.handle_event(&event) {
            Some(SidebarEvent::Select(id)) => select_topic(id, tui, narrow, dispatch),
            Some(SidebarEvent::Dismiss) => {
                tui.sidebar.close();
                false
            }
            None => false,
        },
        _ => match tui.input_box.handle_event(&event) {
            Some(InputEvent::Submit(text)) => dispatch(Action::Submit(text), tui),
            Some(InputEvent::ContentChanged) => false,
            // Up/Down past the first/last input row scroll the conversation
            None => {
                let scroll = match event {
                    TuiEvent::CursorUp => Some(TuiEvent::ScrollUp),
                    TuiEvent::CursorDown => Some(TuiEvent::ScrollDown),
                    _ => None,
                };
                if let Some(scroll) = scroll {
                    tui.message_list.handle_event(&scroll);
                }
                false
            }
        },
    }
}

fn current_areas(tui: &TuiState, frame_area: Rect) -> ui::UiAreas {
    let input_height = tui.input_box.calculate_height(frame_area.width);
    ui::compute_areas(frame_area, input_height, tui.sidebar.open)
}

/// Sends a topic's prompt. The overlay closes on narrow terminals.
fn select_topic<F>(id: String, tui: &mut TuiState, narrow: bool, dispatch: &mut F) -> bool
where
    F: FnMut(Action, &mut TuiState) -> bool,
{
    if narrow {
        tui.sidebar.close();
    } else {
        tui.sidebar.focused = false;
    }
    dispatch(Action::SelectTopic(id), tui)
}

/// Applies an action reported by a turn task. Any change to the
/// conversation brings the newest message back into view, even if the user
/// had scrolled up.
fn apply_turn_action(app: &mut App, tui: &mut TuiState, action: Action) -> Effect {
    let before = (app.conversation.messages().len(), app.conversation.last().cloned());
    let effect = update(app, action);
    if before != (app.conversation.messages().len(), app.conversation.last().cloned()) {
        tui.message_list.scroll_to_bottom();
    }
    effect
}

/// Performs the I/O an `Effect` asks for. Returns true when the app should quit.
fn apply_effect(
    effect: Effect,
    transport: &Arc<Mutex<ChatTransport>>,
    tx: &mpsc::Sender<Action>,
    tui: &mut TuiState,
) -> bool {
    match effect {
        Effect::None => false,
        Effect::Quit => true,
        Effect::SpawnTurn { prompt, reply_id } => {
            tui.message_list.scroll_to_bottom();
            spawn_turn(transport.clone(), prompt, reply_id, tx.clone());
            false
        }
    }
}

fn spawn_turn(
    transport: Arc<Mutex<ChatTransport>>,
    prompt: String,
    reply_id: String,
    tx: mpsc::Sender<Action>,
) {
    info!("Spawning turn {reply_id}");
    tokio::spawn(drive_turn(transport, prompt, reply_id, tx));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::INIT_ERROR_ID;
    use crate::inference::GenerationConfig;

    fn config(api_key: Option<&str>) -> ResolvedConfig {
        ResolvedConfig {
            model_name: "gemini-2.5-flash".to_string(),
            generation: GenerationConfig::default(),
            api_key: api_key.map(str::to_string),
            base_url: "http://127.0.0.1:9".to_string(),
        }
    }

    #[test]
    fn missing_key_reports_init_error_once() {
        let mut app = App::new("gemini-2.5-flash".to_string());
        let transport = build_transport(&config(None), &mut app);
        assert!(!transport.is_initialized());
        assert!(app.conversation.get(INIT_ERROR_ID).is_some());
        assert_eq!(app.conversation.messages().len(), 2);
        assert!(!app.is_loading());
    }

    #[test]
    fn present_key_initializes_session() {
        let mut app = App::new("gemini-2.5-flash".to_string());
        let transport = build_transport(&config(Some("key")), &mut app);
        assert!(transport.is_initialized());
        assert_eq!(app.conversation.messages().len(), 1);
        assert_eq!(
            transport.session().map(|s| s.settings().system_instruction.as_str()),
            Some(SYSTEM_INSTRUCTION)
        );
    }

    fn draw(app: &App, tui: &mut TuiState) {
        let mut terminal =
            ratatui::Terminal::new(ratatui::backend::TestBackend::new(100, 16)).unwrap();
        terminal.draw(|f| ui::draw_ui(f, app, tui, 0)).unwrap();
    }

    #[test]
    fn streamed_chunks_scroll_back_to_newest_after_scrolling_up() {
        let mut app = App::new("gemini-2.5-flash".to_string());
        let mut tui = TuiState::new();
        for round in 0..4 {
            let Effect::SpawnTurn { reply_id, .. } =
                update(&mut app, Action::Submit(format!("question {round}")))
            else {
                panic!("expected a turn");
            };
            let text = "A long answer line.\n\n".repeat(4);
            apply_turn_action(&mut app, &mut tui, Action::ReplyChunk { reply_id: reply_id.clone(), text });
            apply_turn_action(&mut app, &mut tui, Action::ReplyDone { reply_id });
        }
        draw(&app, &mut tui);

        let Effect::SpawnTurn { reply_id, .. } = update(&mut app, Action::Submit("last".into()))
        else {
            panic!("expected a turn");
        };
        draw(&app, &mut tui);
        for _ in 0..5 {
            tui.message_list.handle_event(&TuiEvent::ScrollUp);
        }
        draw(&app, &mut tui);
        assert!(tui.message_list.has_unseen_content());

        let text = "Growing reply.\n\n".repeat(6);
        apply_turn_action(&mut app, &mut tui, Action::ReplyChunk { reply_id: reply_id.clone(), text });
        draw(&app, &mut tui);
        assert!(tui.message_list.follow);
        assert!(!tui.message_list.has_unseen_content());

        // Scrolled up again, the failure notice still pulls the view down
        tui.message_list.handle_event(&TuiEvent::ScrollUp);
        draw(&app, &mut tui);
        assert!(tui.message_list.has_unseen_content());
        apply_turn_action(
            &mut app,
            &mut tui,
            Action::ReplyFailed { reply_id, error: "quota".into() },
        );
        draw(&app, &mut tui);
        assert!(!tui.message_list.has_unseen_content());
    }

    #[test]
    fn stale_turn_action_leaves_scroll_alone() {
        let mut app = App::new("gemini-2.5-flash".to_string());
        let mut tui = TuiState::new();
        tui.message_list.handle_event(&TuiEvent::ScrollUp);
        apply_turn_action(
            &mut app,
            &mut tui,
            Action::ReplyChunk { reply_id: "gone".into(), text: "late".into() },
        );
        assert!(!tui.message_list.follow);
    }
}
