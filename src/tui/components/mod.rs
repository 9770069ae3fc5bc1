//! # TUI Components
//!
//! This module contains all UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as props:
//! - `TitleBar`: app name, model badge and status
//! - `Message`: a single chat bubble (Markdown for the architect's replies)
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: prompt editor, locked while a reply is pending
//! - `MessageList`: scrollable conversation view with layout caching
//! - `Sidebar`: topic shortcuts, docked or as an overlay on narrow terminals
//!
//! Each file holds the component's state, events, rendering and tests.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── message.rs       (Single message renderer)
//! ├── message_list.rs  (Scrollable message container)
//! ├── sidebar.rs       (Topic catalog)
//! └── input_box/       (Prompt editor + row layout)
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod message;
pub use input_box::{InputBox, InputEvent};
pub mod message_list;
pub use message_list::{MessageList, MessageListState};
pub mod sidebar;
pub use sidebar::{Sidebar, SidebarEvent, SidebarState};
