//! # Core Application Logic
//!
//! This module contains the business logic of the Tenancy Architect chat.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No UI. Pure, except    │
//!                    │  for dispatch.          │
//!                    └───────────┬─────────────┘
//!                                │
//!                   ┌────────────┴────────────┐
//!                   ▼                         ▼
//!            ┌────────────┐            ┌────────────┐
//!            │    TUI     │            │ dispatch   │
//!            │  Adapter   │◀─Actions───│ (async     │
//!            │ (ratatui)  │            │  turns)    │
//!            └────────────┘            └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`conversation`]: The ordered message list and its invariants
//! - [`topics`]: Static topic catalog and system instruction
//! - [`dispatch`]: Runs one turn against the transport, reporting via `Action`s
//! - [`config`]: Layered settings (defaults → file → env → CLI)

pub mod action;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod state;
pub mod topics;
