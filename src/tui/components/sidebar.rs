//! # Sidebar Component
//!
//! Topic shortcuts, reference links and a tip. Picking a topic sends its
//! canned prompt.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `SidebarState` lives in `TuiState`
//! - `Sidebar` is created each frame with borrowed state
//!
//! On wide terminals the sidebar is a fixed column left of the chat. Below
//! [`NARROW_WIDTH`] it becomes an overlay toggled with Ctrl+T / F2 that
//! closes itself after a selection.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap};

use crate::core::topics::{self, PRO_TIP, RESOURCES, TOPICS};
use crate::tui::component::EventHandler;
use crate::tui::event::TuiEvent;

/// Terminals narrower than this get the overlay sidebar.
pub const NARROW_WIDTH: u16 = 90;
/// Column width of the docked sidebar.
pub const SIDEBAR_WIDTH: u16 = 34;

const ACCENT: Color = Color::Rgb(56, 189, 248);

pub fn is_narrow(width: u16) -> bool {
    width < NARROW_WIDTH
}

/// Events emitted by the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEvent {
    /// A topic was picked; carries the topic id.
    Select(String),
    /// Keyboard focus should go back to the input box.
    Dismiss,
}

/// Persistent state for the sidebar.
pub struct SidebarState {
    pub selected: usize,
    /// Keyboard focus is on the topic list
    pub focused: bool,
    /// Overlay visibility on narrow terminals (ignored when docked)
    pub open: bool,
    list_state: ListState,
    /// Screen rect of the topic rows from the last render, for click hit testing
    topics_area: Option<Rect>,
}

impl Default for SidebarState {
    fn default() -> Self {
        Self::new()
    }
}

impl SidebarState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            focused: false,
            open: false,
            list_state: ListState::default().with_selected(Some(0)),
            topics_area: None,
        }
    }

    /// Whether the sidebar occupies screen space at this terminal width.
    pub fn is_visible(&self, width: u16) -> bool {
        !is_narrow(width) || self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
        self.focused = self.open;
    }

    /// Hide the overlay and hand focus back after a selection.
    pub fn close(&mut self) {
        self.open = false;
        self.focused = false;
    }

    /// Called on frames where the sidebar is not drawn, so clicks on the
    /// chat underneath never land on a stale topic row.
    pub fn hide(&mut self) {
        self.topics_area = None;
    }

    fn select(&mut self, index: usize) {
        self.selected = index.min(TOPICS.len().saturating_sub(1));
        self.list_state.select(Some(self.selected));
    }

    fn selected_event(&self) -> Option<SidebarEvent> {
        TOPICS
            .get(self.selected)
            .map(|t| SidebarEvent::Select(t.id.to_string()))
    }

    /// Topic index under a screen cell, if any.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.topics_area?;
        if !area.contains(Position::new(column, row)) {
            return None;
        }
        let index = (row - area.y) as usize + self.list_state.offset();
        (index < TOPICS.len()).then_some(index)
    }
}

impl EventHandler for SidebarState {
    type Event = SidebarEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if let TuiEvent::MouseClick(column, row) = *event {
            let index = self.hit_test(column, row)?;
            self.select(index);
            return self.selected_event();
        }
        if !self.focused {
            return None;
        }
        match event {
            TuiEvent::CursorUp => {
                self.select(self.selected.saturating_sub(1));
                None
            }
            TuiEvent::CursorDown => {
                self.select(self.selected + 1);
                None
            }
            TuiEvent::Submit => self.selected_event(),
            TuiEvent::Escape | TuiEvent::FocusNext => Some(SidebarEvent::Dismiss),
            _ => None,
        }
    }
}

/// Transient render wrapper for the sidebar.
pub struct Sidebar<'a> {
    state: &'a mut SidebarState,
    /// Drawn over the chat instead of beside it
    overlay: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(state: &'a mut SidebarState, overlay: bool) -> Self {
        Self { state, overlay }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.overlay {
            frame.render_widget(Clear, area);
        }

        let border_color = if self.state.focused {
            ACCENT
        } else {
            Color::DarkGray
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .title(Span::styled(
                " Architecture Topics ",
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Line::from(" Ctrl+T toggle · Tab focus ").centered())
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let resource_rows = 1 + RESOURCES.len() as u16 * 2;
        let [topics_area, _, resources_area, tip_area] = Layout::vertical([
            Constraint::Length(TOPICS.len() as u16),
            Constraint::Length(1),
            Constraint::Length(resource_rows),
            Constraint::Min(0),
        ])
        .areas(inner);

        self.state.topics_area = Some(topics_area);
        let items: Vec<ListItem> = TOPICS
            .iter()
            .map(|topic| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", topics::icon_glyph(topic.icon)),
                        Style::default().fg(ACCENT),
                    ),
                    Span::raw(topic.title),
                ]))
            })
            .collect();
        let highlight = if self.state.focused {
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(Color::White)
        };
        let list = List::new(items)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(highlight);
        frame.render_stateful_widget(list, topics_area, &mut self.state.list_state);

        let mut resource_lines = vec![Line::from(Span::styled(
            "Resources",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ))];
        for resource in RESOURCES {
            resource_lines.push(Line::from(format!("↗ {}", resource.title)));
            resource_lines.push(Line::from(Span::styled(
                format!("  {}", resource.url),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::UNDERLINED),
            )));
        }
        frame.render_widget(
            Paragraph::new(resource_lines).style(Style::default().fg(Color::Gray)),
            resources_area,
        );

        let tip = Paragraph::new(vec![
            Line::from(Span::styled(
                "Pro Tip",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                PRO_TIP,
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            )),
        ])
        .wrap(Wrap { trim: true });
        frame.render_widget(tip, tip_area);
    }
}
