use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    // Routed to core::update
    ForceQuit, // Ctrl+C / Ctrl+Q
    Submit,

    // TUI-local events (handled directly in TUI)
    Escape,
    InputChar(char),
    Paste(String), // Bracketed paste - preserves newlines
    Backspace,
    Delete,
    DeleteWordBack, // Ctrl+W / Ctrl+Backspace
    CursorLeft,
    CursorRight,
    WordLeft,
    WordRight,
    CursorHome,
    CursorEnd,
    CursorUp,
    CursorDown,
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollToBottom, // Ctrl+End - also re-enables stick-to-bottom
    ToggleSidebar,  // Ctrl+T or F2
    FocusNext,      // Tab: input ⇄ topic list
    MouseMove(u16, u16),
    MouseClick(u16, u16),
    Resize,
}

/// Poll for an event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: std::time::Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => match event::read() {
            Ok(ev) => map_event(ev),
            Err(e) => {
                log::warn!("Failed to read terminal event: {e}");
                None
            }
        },
        Ok(false) => None,
        Err(e) => {
            log::warn!("Failed to poll terminal events: {e}");
            None
        }
    }
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(std::time::Duration::ZERO)
}

/// Translate a raw crossterm event. Key releases are dropped.
pub fn map_event(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key_event) => {
            if key_event.kind == KeyEventKind::Release {
                return None;
            }
            log::debug!(
                "Key event: {:?} with modifiers {:?}",
                key_event.code,
                key_event.modifiers
            );
            map_key(key_event)
        }
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::Moved => {
                Some(TuiEvent::MouseMove(mouse_event.column, mouse_event.row))
            }
            MouseEventKind::Down(MouseButton::Left) => {
                Some(TuiEvent::MouseClick(mouse_event.column, mouse_event.row))
            }
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(..) => Some(TuiEvent::Resize),
        _ => None,
    }
}

fn map_key(key_event: KeyEvent) -> Option<TuiEvent> {
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
    let event = match key_event.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => TuiEvent::ForceQuit,
        KeyCode::Char('t') if ctrl => TuiEvent::ToggleSidebar,
        KeyCode::Char('w') if ctrl => TuiEvent::DeleteWordBack,
        // Ctrl+J inserts newline (ASCII LF; Ctrl+Enter sends this in most terminals)
        KeyCode::Char('j') if ctrl => TuiEvent::InputChar('\n'),
        KeyCode::Char(_) if ctrl => return None,
        KeyCode::Char(c) => TuiEvent::InputChar(c),
        KeyCode::Enter if key_event.modifiers.contains(KeyModifiers::SHIFT) => {
            TuiEvent::InputChar('\n')
        }
        KeyCode::Enter => TuiEvent::Submit,
        KeyCode::Backspace if ctrl => TuiEvent::DeleteWordBack,
        KeyCode::Backspace => TuiEvent::Backspace,
        KeyCode::Delete => TuiEvent::Delete,
        KeyCode::Left if ctrl => TuiEvent::WordLeft,
        KeyCode::Right if ctrl => TuiEvent::WordRight,
        KeyCode::Left => TuiEvent::CursorLeft,
        KeyCode::Right => TuiEvent::CursorRight,
        KeyCode::Home => TuiEvent::CursorHome,
        KeyCode::End if ctrl => TuiEvent::ScrollToBottom,
        KeyCode::End => TuiEvent::CursorEnd,
        KeyCode::Up => TuiEvent::CursorUp,
        KeyCode::Down => TuiEvent::CursorDown,
        KeyCode::PageUp => TuiEvent::ScrollPageUp,
        KeyCode::PageDown => TuiEvent::ScrollPageDown,
        KeyCode::F(2) => TuiEvent::ToggleSidebar,
        KeyCode::Tab | KeyCode::BackTab => TuiEvent::FocusNext,
        KeyCode::Esc => TuiEvent::Escape,
        _ => return None,
    };
    Some(event)
}
