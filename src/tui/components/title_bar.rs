//! # TitleBar Component
//!
//! Top status bar: application name, the connected model and the current
//! status. Shows "↓ New" when the conversation has content below the
//! viewport.
//!
//! ## Design Decisions
//!
//! TitleBar is purely presentational. It receives all data as props and has
//! no internal state:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new(
//!     app.model_name.clone(),
//!     app.status_message.clone(),
//!     tui.message_list.has_unseen_content(),
//! );
//! title_bar.render(frame, area);
//! ```
//!
//! Segments are dropped right-to-left when the terminal is too narrow, so the
//! application name and model badge stay visible longest.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::Component;

pub const APP_TITLE: &str = "Tenancy Architect";

const ACCENT: Color = Color::Rgb(56, 189, 248);

pub struct TitleBar {
    /// Model name shown in the badge
    pub model_name: String,
    /// Status message (e.g., "Ready", "Streaming...")
    pub status_message: String,
    /// Whether there's content below the current scroll position
    pub has_unseen_content: bool,
}

impl TitleBar {
    pub fn new(model_name: String, status_message: String, has_unseen_content: bool) -> Self {
        Self {
            model_name,
            status_message,
            has_unseen_content,
        }
    }

    fn spans(&self, width: u16) -> Vec<Span<'static>> {
        let separator = || Span::styled(" │ ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![
            Span::styled(
                format!(" {APP_TITLE}"),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            separator(),
            Span::styled(
                format!("● {} connected", self.model_name),
                Style::default().fg(Color::Green),
            ),
        ];
        let optional = [
            (!self.status_message.is_empty()).then(|| {
                Span::styled(self.status_message.clone(), Style::default().fg(Color::Gray))
            }),
            self.has_unseen_content.then(|| {
                Span::styled(
                    "↓ New",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )
            }),
        ];

        let mut used: usize = spans.iter().map(|s| s.content.width()).sum();
        for span in optional.into_iter().flatten() {
            let needed = 3 + span.content.width();
            if used + needed > width as usize {
                break;
            }
            used += needed;
            spans.push(separator());
            spans.push(span);
        }
        spans
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Line::from(self.spans(area.width)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(title_bar: &mut TitleBar, width: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, 1)).unwrap();
        terminal.draw(|f| title_bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_title_bar_shows_model_and_status() {
        let mut title_bar = TitleBar::new(
            "gemini-2.5-flash".to_string(),
            "Streaming...".to_string(),
            false,
        );
        let text = render(&mut title_bar, 100);

        assert!(text.contains("Tenancy Architect"));
        assert!(text.contains("gemini-2.5-flash connected"));
        assert!(text.contains("Streaming..."));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_with_unseen_content() {
        let mut title_bar =
            TitleBar::new("gemini-2.5-flash".to_string(), "Ready".to_string(), true);
        let text = render(&mut title_bar, 100);
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_empty_status_has_no_trailing_separator() {
        let mut title_bar = TitleBar::new("m".to_string(), String::new(), false);
        let spans = title_bar.spans(100);
        assert_eq!(spans.len(), 3);
        assert!(render(&mut title_bar, 60).contains("m connected"));
    }

    #[test]
    fn test_title_bar_drops_status_when_narrow() {
        let title_bar = TitleBar::new(
            "gemini-2.5-flash".to_string(),
            "Request failed".to_string(),
            true,
        );
        let spans = title_bar.spans(50);
        let text: String = spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("gemini-2.5-flash"));
        assert!(!text.contains("Request failed"));
        assert!(!text.contains("↓ New"));
    }
}
