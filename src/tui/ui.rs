//! Frame layout.
//!
//! ```text
//! ┌ sidebar ┐ title bar
//! │ topics  │ message list
//! │ links   │ loading line
//! │ tip     │ input box
//! └─────────┘ footer
//! ```
//!
//! Below `NARROW_WIDTH` the sidebar is not docked; when open it is drawn over
//! the left edge of the chat instead.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::sidebar::{SIDEBAR_WIDTH, is_narrow};
use crate::tui::components::{MessageList, Sidebar, TitleBar};

pub const LOADING_TEXT: &str = "Generating Architecture...";
pub const FOOTER_TEXT: &str =
    "Generates Laravel 10/11 compliant code. Always verify architecture in staging.";

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Screen regions for one frame. Shared by drawing and mouse hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiAreas {
    /// Docked sidebar column, or the overlay rect when open on a narrow terminal
    pub sidebar: Option<Rect>,
    pub sidebar_overlay: bool,
    pub title: Rect,
    pub messages: Rect,
    pub loading: Rect,
    pub input: Rect,
    pub footer: Rect,
}

pub fn compute_areas(frame_area: Rect, input_height: u16, sidebar_open: bool) -> UiAreas {
    use Constraint::{Length, Min};

    let narrow = is_narrow(frame_area.width);
    let (sidebar, chat_area) = if narrow {
        (None, frame_area)
    } else {
        let [side, chat] = Layout::horizontal([Length(SIDEBAR_WIDTH), Min(0)]).areas(frame_area);
        (Some(side), chat)
    };

    let [title, messages, loading, input, footer] =
        Layout::vertical([Length(1), Min(0), Length(1), Length(input_height), Length(1)])
            .areas(chat_area);

    let (sidebar, sidebar_overlay) = match sidebar {
        Some(docked) => (Some(docked), false),
        None if sidebar_open => (
            Some(Rect {
                width: SIDEBAR_WIDTH.min(frame_area.width),
                ..frame_area
            }),
            true,
        ),
        None => (None, false),
    };

    UiAreas {
        sidebar,
        sidebar_overlay,
        title,
        messages,
        loading,
        input,
        footer,
    }
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    tui.input_box.disabled = app.is_loading();
    let input_height = tui.input_box.calculate_height(frame.area().width);
    let areas = compute_areas(frame.area(), input_height, tui.sidebar.open);

    let mut title_bar = TitleBar::new(
        app.model_name.clone(),
        app.status_message.clone(),
        tui.message_list.has_unseen_content(),
    );
    title_bar.render(frame, areas.title);

    MessageList::new(
        &mut tui.message_list,
        app.conversation.messages(),
        tui.pulse_value,
    )
    .render(frame, areas.messages);

    if app.is_loading() {
        let glyph = SPINNER[spinner_frame % SPINNER.len()];
        frame.render_widget(
            Line::from(vec![
                Span::styled(format!(" {glyph} "), Style::default().fg(Color::Rgb(56, 189, 248))),
                Span::styled(
                    LOADING_TEXT,
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]),
            areas.loading,
        );
    }

    tui.input_box.render(frame, areas.input);

    frame.render_widget(
        Line::from(Span::styled(FOOTER_TEXT, Style::default().fg(Color::DarkGray))).centered(),
        areas.footer,
    );

    // Drawn last so the overlay sits on top of the chat
    match areas.sidebar {
        Some(sidebar_area) => {
            Sidebar::new(&mut tui.sidebar, areas.sidebar_overlay).render(frame, sidebar_area)
        }
        None => tui.sidebar.hide(),
    }
}
