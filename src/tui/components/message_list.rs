//! # Message List
//!
//! Scrollable view of the conversation.
//!
//! `MessageList` is rebuilt every frame from `&mut MessageListState` plus the
//! messages to show. The state owns everything that must survive between
//! frames: the scroll position, whether the view follows new content, the
//! hovered message, and the measured height of every message.
//!
//! Heights are cached per message and keyed on the message's id, a digest of
//! its text and its streaming flag, so only messages whose content changed
//! since the last frame are re-measured. A width change drops the whole cache.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::Range;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::conversation;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

/// Identifies the content a cached height was measured from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    id: String,
    text_digest: u64,
    streaming: bool,
}

impl Fingerprint {
    fn of(message: &conversation::Message) -> Self {
        let mut hasher = DefaultHasher::new();
        message.text.hash(&mut hasher);
        Self {
            id: message.id.clone(),
            text_digest: hasher.finish(),
            streaming: message.is_streaming,
        }
    }
}

/// Measured rows per message, plus running totals for offset lookups.
#[derive(Default)]
pub struct Heights {
    width: u16,
    entries: Vec<(Fingerprint, u16)>,
    /// `bottoms[i]` is the first content row below message `i`.
    bottoms: Vec<u16>,
}

impl Heights {
    /// Brings the cache in line with `messages` at `width`. Returns how many
    /// messages had to be measured.
    pub fn sync(&mut self, messages: &[conversation::Message], width: u16) -> usize {
        if width != self.width {
            self.width = width;
            self.entries.clear();
        }
        self.entries.truncate(messages.len());

        let mut measured = 0;
        for (index, message) in messages.iter().enumerate() {
            let fingerprint = Fingerprint::of(message);
            if self.entries.get(index).is_some_and(|(f, _)| *f == fingerprint) {
                continue;
            }
            let height = Message::calculate_height(message, width);
            measured += 1;
            if index < self.entries.len() {
                self.entries[index] = (fingerprint, height);
            } else {
                self.entries.push((fingerprint, height));
            }
        }

        let mut bottom = 0u16;
        self.bottoms = self
            .entries
            .iter()
            .map(|(_, height)| {
                bottom = bottom.saturating_add(*height);
                bottom
            })
            .collect();
        measured
    }

    pub fn total(&self) -> u16 {
        self.bottoms.last().copied().unwrap_or(0)
    }

    pub fn height(&self, index: usize) -> u16 {
        self.entries.get(index).map_or(0, |(_, h)| *h)
    }

    /// First content row of message `index`.
    pub fn top(&self, index: usize) -> u16 {
        match index {
            0 => 0,
            i => self.bottoms.get(i - 1).copied().unwrap_or_else(|| self.total()),
        }
    }

    /// Index of the message covering content row `row`.
    pub fn index_at(&self, row: u16) -> Option<usize> {
        let index = self.bottoms.partition_point(|&bottom| bottom <= row);
        (index < self.bottoms.len()).then_some(index)
    }

    /// Messages overlapping `rows`, padded by half a viewport on each side so
    /// small scrolls don't expose undrawn rows.
    pub fn overlapping(&self, rows: Range<u16>) -> Range<usize> {
        let pad = rows.len() as u16 / 2;
        let from = rows.start.saturating_sub(pad);
        let to = rows.end.saturating_add(pad);
        let start = self.bottoms.partition_point(|&bottom| bottom <= from);
        let end = self.bottoms.partition_point(|&bottom| bottom < to);
        start..(end + 1).min(self.bottoms.len())
    }
}

pub struct MessageListState {
    scroll: ScrollViewState,
    pub heights: Heights,
    /// Keep the newest message in view as content grows.
    pub follow: bool,
    /// Message under the mouse pointer.
    pub selected_index: Option<usize>,
    viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll: ScrollViewState::default(),
            heights: Heights::default(),
            follow: true,
            selected_index: None,
            viewport_height: 0,
        }
    }

    pub fn scroll_offset(&self) -> u16 {
        self.scroll.offset().y
    }

    fn bottom_offset(&self) -> u16 {
        self.heights.total().saturating_sub(self.viewport_height)
    }

    fn set_offset(&mut self, y: u16) {
        self.scroll.set_offset(Position { x: 0, y });
    }

    /// True when the viewport is scrolled above the newest content.
    pub fn has_unseen_content(&self) -> bool {
        self.scroll_offset() < self.bottom_offset()
    }

    /// Jump to the newest message and follow new content again.
    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
        self.scroll.scroll_to_bottom();
    }

    /// Updates the hovered message from a pointer position inside `area`.
    pub fn hover(&mut self, column: u16, row: u16, area: Rect) {
        self.selected_index = area
            .contains(Position::new(column, row))
            .then(|| (row - area.y).saturating_add(self.scroll_offset()))
            .and_then(|content_row| self.heights.index_at(content_row));
    }

    /// After a downward scroll: snap to the end and resume following once
    /// the bottom is reached.
    fn settle_after_scroll_down(&mut self) {
        let bottom = self.bottom_offset();
        if self.scroll_offset() >= bottom {
            self.set_offset(bottom);
            self.follow = true;
        }
    }
}

/// Per-frame view over [`MessageListState`].
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [conversation::Message],
    pub pulse_value: f32,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        messages: &'a [conversation::Message],
        pulse_value: f32,
    ) -> Self {
        Self {
            state,
            messages,
            pulse_value,
        }
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        // One column is reserved for the scrollbar
        let width = area.width.saturating_sub(1);
        let state = &mut *self.state;
        state.heights.sync(self.messages, width);
        state.viewport_height = area.height;

        let offset = if state.follow {
            state.bottom_offset()
        } else {
            state.scroll_offset().min(state.bottom_offset())
        };
        state.set_offset(offset);

        let mut canvas = ScrollView::new(Size::new(width, state.heights.total()))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let visible = state
            .heights
            .overlapping(offset..offset.saturating_add(area.height));
        for index in visible {
            let message = &self.messages[index];
            let hovered = state.selected_index == Some(index) && !message.is_streaming;
            let pulse = if message.is_streaming { self.pulse_value } else { 0.0 };
            let rect = Rect::new(0, state.heights.top(index), width, state.heights.height(index));
            canvas.render_widget(Message::new(message, hovered, pulse), rect);
        }

        frame.render_stateful_widget(canvas, area, &mut state.scroll);
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => {
                self.follow = false;
                self.scroll.scroll_up();
            }
            TuiEvent::ScrollPageUp => {
                self.follow = false;
                self.scroll.scroll_page_up();
            }
            TuiEvent::ScrollDown => {
                self.scroll.scroll_down();
                self.settle_after_scroll_down();
            }
            TuiEvent::ScrollPageDown => {
                self.scroll.scroll_page_down();
                self.settle_after_scroll_down();
            }
            TuiEvent::ScrollToBottom => self.scroll_to_bottom(),
            _ => {}
        }
        None
    }
}
