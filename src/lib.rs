//! Terminal chat client for a Gemini-backed Laravel multi-tenancy architect.

pub mod core;
pub mod inference;
pub mod tui;

#[cfg(test)]
pub mod test_support;
