//! Multi-line prompt editor at the bottom of the chat.
//!
//! Enter submits; Shift+Enter and Ctrl+J insert a newline. The buffer, caret
//! and scroll are owned here. `disabled` is set by the parent each frame and
//! is true while a reply is pending, during which all input is ignored.

mod layout;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use layout::{
    CONTENT_OFFSET_X, MAX_VISIBLE_ROWS, VERTICAL_OVERHEAD, caret_cell, inner_width,
    is_soft_wrapped, next_char, next_word, offset_at_column, prev_char, prev_word, rows,
};

pub const PLACEHOLDER: &str =
    "Ask about Multi-Tenancy (e.g., 'How to separate tenant databases?')";

const ACCENT: Color = Color::Rgb(56, 189, 248);

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter on a non-blank buffer; carries the text and clears the box
    Submit(String),
    /// Text or caret changed
    ContentChanged,
}

pub struct InputBox {
    pub buffer: String,
    /// Set while a reply is pending
    pub disabled: bool,
    /// Caret as byte offset in buffer (0..=buffer.len())
    caret: usize,
    /// First visible row when the content is taller than the box
    scroll: u16,
    /// Outer width from the last render, used for vertical caret movement
    last_width: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    const DEFAULT_WIDTH: u16 = 80;

    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            disabled: false,
            caret: 0,
            scroll: 0,
            last_width: Self::DEFAULT_WIDTH,
        }
    }

    /// Height for the current buffer, in `[1, MAX_VISIBLE_ROWS] + VERTICAL_OVERHEAD`.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let row_count = rows(&self.buffer, inner_width(area_width)).len() as u16;
        row_count.clamp(1, MAX_VISIBLE_ROWS) + VERTICAL_OVERHEAD
    }

    fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.caret, text);
        self.caret += text.len();
    }

    fn move_caret(&mut self, to: usize) -> Option<InputEvent> {
        (to != self.caret).then(|| {
            self.caret = to;
            InputEvent::ContentChanged
        })
    }

    fn delete_range(&mut self, start: usize, end: usize) -> Option<InputEvent> {
        (start < end).then(|| {
            self.buffer.drain(start..end);
            self.caret = start;
            InputEvent::ContentChanged
        })
    }

    /// Moves the caret one row up or down, keeping its display column.
    /// Returns `None` at the first/last row so the caller can scroll instead.
    fn move_vertically(&mut self, down: bool) -> Option<InputEvent> {
        let rs = rows(&self.buffer, inner_width(self.last_width));
        let (row, col) = caret_cell(&self.buffer, &rs, self.caret);
        let target = if down {
            (row + 1 < rs.len()).then_some(row + 1)?
        } else {
            row.checked_sub(1)?
        };

        let mut pos = offset_at_column(&self.buffer, rs[target], col);
        // Landing on a soft-wrap seam would show the caret on the next row
        if pos == rs[target].end && is_soft_wrapped(&rs, target) {
            pos = prev_char(&self.buffer, pos);
        }
        self.move_caret(pos)
    }

    fn line_start(&self) -> usize {
        self.buffer[..self.caret]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn line_end(&self) -> usize {
        self.buffer[self.caret..]
            .find('\n')
            .map(|i| self.caret + i)
            .unwrap_or(self.buffer.len())
    }

    /// Keeps the caret row inside the visible window.
    fn update_scroll(&mut self, width: u16) {
        let rs = rows(&self.buffer, width);
        if rs.len() as u16 <= MAX_VISIBLE_ROWS {
            self.scroll = 0;
            return;
        }
        let (row, _) = caret_cell(&self.buffer, &rs, self.caret);
        let row = row as u16;
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + MAX_VISIBLE_ROWS {
            self.scroll = row + 1 - MAX_VISIBLE_ROWS;
        }
    }

    fn render_scrollbar(&self, frame: &mut Frame, area: Rect, total_rows: u16) {
        use ratatui::widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState};

        if total_rows <= MAX_VISIBLE_ROWS {
            return;
        }

        // ScrollbarState content_length is max scrollable position, not total items
        let max_scroll = total_rows.saturating_sub(MAX_VISIBLE_ROWS);
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(max_scroll as usize)
            .position(self.scroll as usize);

        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };

        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.last_width = area.width;
        let width = inner_width(area.width);
        self.update_scroll(width);

        let border_style = if self.disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(ACCENT)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(" Ask the architect ")
            .padding(Padding::horizontal(1));

        let rs = rows(&self.buffer, width);
        let lines: Vec<Line> = if self.buffer.is_empty() {
            vec![Line::from(Span::styled(
                PLACEHOLDER,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))]
        } else {
            rs.iter()
                .skip(self.scroll as usize)
                .take(MAX_VISIBLE_ROWS as usize)
                .map(|r| Line::raw(&self.buffer[r.start..r.end]))
                .collect()
        };

        let text_style = if self.disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        frame.render_widget(Paragraph::new(lines).style(text_style).block(block), area);
        self.render_scrollbar(frame, area, rs.len() as u16);

        if !self.disabled {
            let (row, col) = caret_cell(&self.buffer, &rs, self.caret);
            let visible_row = (row as u16).saturating_sub(self.scroll);
            frame.set_cursor_position((
                area.x + CONTENT_OFFSET_X + col.min(width),
                area.y + 1 + visible_row,
            ));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.disabled {
            return None;
        }
        match event {
            TuiEvent::InputChar(c) => {
                let mut utf8 = [0u8; 4];
                self.insert(c.encode_utf8(&mut utf8));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                // Normalize CRLF from pasted clipboard content
                self.insert(&text.replace("\r\n", "\n"));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => self.delete_range(prev_char(&self.buffer, self.caret), self.caret),
            TuiEvent::Delete => self.delete_range(self.caret, next_char(&self.buffer, self.caret)),
            TuiEvent::DeleteWordBack => {
                self.delete_range(prev_word(&self.buffer, self.caret), self.caret)
            }
            TuiEvent::CursorLeft => self.move_caret(prev_char(&self.buffer, self.caret)),
            TuiEvent::CursorRight => self.move_caret(next_char(&self.buffer, self.caret)),
            TuiEvent::WordLeft => self.move_caret(prev_word(&self.buffer, self.caret)),
            TuiEvent::WordRight => self.move_caret(next_word(&self.buffer, self.caret)),
            TuiEvent::CursorHome => self.move_caret(self.line_start()),
            TuiEvent::CursorEnd => self.move_caret(self.line_end()),
            TuiEvent::CursorUp => self.move_vertically(false),
            TuiEvent::CursorDown => self.move_vertically(true),
            TuiEvent::Submit => {
                if self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.caret = 0;
                self.scroll = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}
