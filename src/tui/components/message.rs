use chrono::{DateTime, Local};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::conversation::{self, Sender};
use crate::tui::component::Component;
use crate::tui::markdown;

/// Blank columns inside each vertical border.
const CONTENT_PAD_H: u16 = 1;
/// Columns taken by the two borders and their padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Rows taken by the top and bottom borders.
const VERTICAL_OVERHEAD: u16 = 2;

const USER_COLOR: Color = Color::Cyan;
const AI_COLOR: Color = Color::Rgb(56, 189, 248);
const BODY_COLOR: Color = Color::Gray;

/// Shown inside a streaming reply before its first chunk arrives.
const PENDING_TEXT: &str = "Designing architecture...";

/// One bubble in the conversation: a rounded border titled with the sender
/// and local `HH:MM`, around the message body.
///
/// User text is shown verbatim; replies go through the Markdown renderer.
/// A reply that is still streaming breathes its border with `pulse_intensity`
/// and, until its first chunk lands, shows [`PENDING_TEXT`].
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a conversation::Message,
    /// Under the mouse pointer
    pub is_selected: bool,
    /// 0.0..=1.0 while streaming
    pub pulse_intensity: f32,
}

impl<'a> Message<'a> {
    pub fn new(message: &'a conversation::Message, is_selected: bool, pulse_intensity: f32) -> Self {
        Self {
            message,
            is_selected,
            pulse_intensity,
        }
    }

    /// Rows needed to draw `message` at `width`, measured on the same
    /// `Paragraph` that `render` draws.
    pub fn calculate_height(message: &conversation::Message, width: u16) -> u16 {
        match width.checked_sub(HORIZONTAL_OVERHEAD) {
            Some(inner) if inner > 0 => {
                let rows = body(message).line_count(inner);
                u16::try_from(rows).unwrap_or(u16::MAX).max(1) + VERTICAL_OVERHEAD
            }
            _ => 1,
        }
    }

    fn frame_style(&self) -> Style {
        let base = Style::default().fg(accent(self.message.sender));
        let resting = if self.is_selected {
            base
        } else {
            base.add_modifier(Modifier::DIM)
        };
        // Breathing: dim, then plain, then bold as the pulse rises
        match self.pulse_intensity {
            p if p > 0.6 => resting
                .remove_modifier(Modifier::DIM)
                .add_modifier(Modifier::BOLD),
            p if p > 0.2 => resting.remove_modifier(Modifier::DIM),
            _ => resting,
        }
    }
}

fn accent(sender: Sender) -> Color {
    match sender {
        Sender::User => USER_COLOR,
        Sender::Ai => AI_COLOR,
    }
}

fn label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "you",
        Sender::Ai => "architect",
    }
}

/// Local wall-clock `HH:MM` for a millisecond timestamp.
fn format_time(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

fn body(message: &conversation::Message) -> Paragraph<'static> {
    let content = message.text.trim_end();
    let text = match (content.trim().is_empty(), message.sender) {
        (true, _) if message.is_streaming => Text::from(Span::styled(
            PENDING_TEXT,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
        (true, _) => Text::default(),
        (false, Sender::Ai) => markdown::render(content, BODY_COLOR),
        (false, Sender::User) => Text::styled(content.to_string(), Style::default().fg(Color::White)),
    };
    Paragraph::new(text).wrap(Wrap { trim: false })
}

impl Widget for Message<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = self.frame_style();
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(style)
            .title_style(style)
            .title(Line::from(label(self.message.sender)).left_aligned())
            .title(Line::from(format_time(self.message.timestamp)).right_aligned())
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner = block.inner(area);
        block.render(area, buf);
        body(self.message).render(inner, buf);
    }
}

impl Component for Message<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
